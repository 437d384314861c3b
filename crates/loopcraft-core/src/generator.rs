use tracing::debug;

use loopcraft_critic::Verdict;
use loopcraft_llm::{ChatClient, Message};

use crate::context::IterationRecord;
use crate::error::GenerationError;

const SYSTEM_PROMPT: &str = "You are an expert software engineer producing a single work artifact. \
Reply with the complete artifact only: no preamble, no commentary, no surrounding explanation.";

/// The generator role: drafts the initial artifact and revises it from
/// accumulated critique.
pub struct Generator<'a> {
    client: &'a dyn ChatClient,
}

impl<'a> Generator<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self { client }
    }

    /// Produce the next artifact version.
    ///
    /// The transcript always carries every prior (artifact, critique) pair,
    /// so revision calls see the full history rather than only the latest
    /// feedback. A failed call or empty completion is fatal to the run.
    pub async fn draft(
        &self,
        task: &str,
        history: &[IterationRecord],
    ) -> Result<String, GenerationError> {
        let messages = Self::transcript(task, history);

        debug!(
            generator = self.client.name(),
            prior_iterations = history.len(),
            "Running generator"
        );

        let artifact = self.client.complete(&messages).await?;
        if artifact.trim().is_empty() {
            return Err(GenerationError::EmptyArtifact);
        }
        Ok(artifact)
    }

    /// Cumulative conversation for a generator call: system prompt, the
    /// task, then each committed iteration as an assistant/user pair in
    /// chronological order.
    pub fn transcript(task: &str, history: &[IterationRecord]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2 + history.len() * 2);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.push(Message::user(initial_request(task)));

        for record in history {
            messages.push(Message::assistant(record.artifact.clone()));
            messages.push(Message::user(revision_request(&record.verdict)));
        }

        messages
    }
}

fn initial_request(task: &str) -> String {
    format!("Task:\n{task}\n\nProduce the artifact.")
}

fn revision_request(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Revise { critique, .. } => format!(
            "Reviewer feedback on your previous version:\n{critique}\n\n\
             Revise the artifact to address every point. Reply with the complete revised artifact."
        ),
        // No usable feedback for that round; ask for a self-directed pass.
        Verdict::Approved | Verdict::Degraded { .. } => {
            "No reviewer feedback was available for your previous version. \
             Re-examine the task requirements and improve the artifact where you can. \
             Reply with the complete revised artifact."
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loopcraft_llm::testing::ScriptedClient;
    use loopcraft_llm::{LlmError, Role};

    fn record(iteration: usize, artifact: &str, verdict: Verdict) -> IterationRecord {
        IterationRecord {
            iteration,
            artifact: artifact.to_string(),
            verdict,
            generation_secs: 0.0,
            review_secs: 0.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn first_call_transcript_is_task_only() {
        let messages = Generator::transcript("write factorial", &[]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("write factorial"));
    }

    #[test]
    fn revision_transcript_carries_every_prior_pair() {
        let history = vec![
            record(
                1,
                "v1",
                Verdict::Revise {
                    critique: "- missing validation".into(),
                    issues: vec!["missing validation".into()],
                },
            ),
            record(
                2,
                "v2",
                Verdict::Revise {
                    critique: "- no docstring".into(),
                    issues: vec!["no docstring".into()],
                },
            ),
        ];

        let messages = Generator::transcript("task", &history);
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[2].content, "v1");
        assert!(messages[3].content.contains("missing validation"));
        assert_eq!(messages[4].content, "v2");
        assert!(messages[5].content.contains("no docstring"));
    }

    #[test]
    fn degraded_round_asks_for_self_directed_revision() {
        let history = vec![record(
            1,
            "v1",
            Verdict::Degraded {
                reason: "timeout".into(),
            },
        )];
        let messages = Generator::transcript("task", &history);
        assert!(messages[3].content.contains("No reviewer feedback"));
    }

    #[tokio::test]
    async fn client_failure_is_fatal() {
        let client = ScriptedClient::new(vec![Err(LlmError::InvalidResponse("boom".into()))]);
        let generator = Generator::new(&client);

        let err = generator.draft("task", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::Client(_)));
    }

    #[tokio::test]
    async fn blank_artifact_is_fatal() {
        let client = ScriptedClient::replying(&["   \n"]);
        let generator = Generator::new(&client);

        let err = generator.draft("task", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyArtifact));
    }
}
