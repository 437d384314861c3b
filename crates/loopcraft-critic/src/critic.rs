use loopcraft_llm::ChatClient;
use tracing::{debug, warn};

use crate::prompts::CriticPrompts;
use crate::verdict::Verdict;

/// The critic role: one review call per iteration.
pub struct Critic<'a> {
    client: &'a dyn ChatClient,
}

impl<'a> Critic<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self { client }
    }

    /// Review an artifact against the fixed checklist.
    ///
    /// Never fails the run: a failed call or unusable critique becomes
    /// [`Verdict::Degraded`] so the loop can keep making forward progress.
    pub async fn review(&self, task: &str, artifact: &str, iteration: usize) -> Verdict {
        let messages = CriticPrompts::review_messages(task, artifact, iteration);

        debug!(
            iteration,
            critic = self.client.name(),
            "Running critic review"
        );

        match self.client.complete(&messages).await {
            Ok(text) => Verdict::from_critique(&text),
            Err(e) => {
                warn!(iteration, error = %e, "Critic call failed; continuing without feedback");
                Verdict::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopcraft_llm::testing::ScriptedClient;
    use loopcraft_llm::LlmError;

    #[tokio::test]
    async fn approval_reply_classifies_as_approved() {
        let client = ScriptedClient::replying(&["NO FURTHER CHANGES NEEDED"]);
        let critic = Critic::new(&client);

        let verdict = critic.review("task", "artifact", 1).await;
        assert!(verdict.is_approved());
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_call_degrades_instead_of_erroring() {
        let client = ScriptedClient::new(vec![Err(LlmError::RateLimited("busy".into()))]);
        let critic = Critic::new(&client);

        let verdict = critic.review("task", "artifact", 1).await;
        assert!(verdict.is_degraded());
    }

    #[tokio::test]
    async fn review_prompt_includes_artifact() {
        let client = ScriptedClient::replying(&["- tighten error handling"]);
        let critic = Critic::new(&client);

        critic.review("the task", "the artifact body", 3).await;

        let calls = client.calls();
        assert!(calls[0][1].content.contains("the artifact body"));
        assert!(calls[0][1].content.contains("the task"));
    }
}
