//! Parallel fan-out / fan-in: run independent sub-task prompts
//! concurrently, wait for all of them, then merge with one synthesis call.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use loopcraft_llm::{ChatClient, Message};

use crate::error::PatternError;

/// One independent branch. The prompt's `{task}` placeholder receives the
/// overall task.
#[derive(Debug, Clone)]
pub struct SubTask {
    pub name: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchOutput {
    pub name: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FanOutResult {
    pub merged: String,
    pub branches: Vec<BranchOutput>,
}

/// The synthesizer role: merges labeled branch outputs into one artifact.
pub struct Synthesizer<'a> {
    client: &'a dyn ChatClient,
}

impl<'a> Synthesizer<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self { client }
    }

    pub async fn merge(
        &self,
        task: &str,
        branches: &[BranchOutput],
    ) -> Result<String, PatternError> {
        let mut sections = String::new();
        for branch in branches {
            sections.push_str(&format!("## {}\n{}\n\n", branch.name, branch.output));
        }

        let prompt = format!(
            "Overall task: {task}\n\n\
             The following sections were produced independently:\n\n{sections}\
             Synthesize them into one coherent result that fulfils the overall task."
        );

        self.client
            .complete(&[
                Message::system(
                    "You merge independently produced sections into one coherent result. \
                     Preserve every substantive point; remove duplication.",
                ),
                Message::user(prompt),
            ])
            .await
            .map_err(PatternError::step("synthesize"))
    }
}

/// Fans sub-tasks out concurrently and synthesizes the results.
///
/// All branches are independent external calls; the only coordination is
/// waiting for all of them. Any branch failure fails the whole operation.
pub struct FanOut<'a> {
    client: &'a dyn ChatClient,
    subtasks: Vec<SubTask>,
}

impl<'a> FanOut<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self {
            client,
            subtasks: Vec::new(),
        }
    }

    pub fn subtask(mut self, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.subtasks.push(SubTask {
            name: name.into(),
            prompt: prompt.into(),
        });
        self
    }

    pub async fn run(&self, task: &str) -> Result<FanOutResult, PatternError> {
        debug!(branches = self.subtasks.len(), "Fanning out sub-tasks");

        let branches = try_join_all(
            self.subtasks
                .iter()
                .map(|subtask| self.run_branch(subtask, task)),
        )
        .await?;

        let merged = Synthesizer::new(self.client).merge(task, &branches).await?;

        Ok(FanOutResult { merged, branches })
    }

    async fn run_branch(
        &self,
        subtask: &SubTask,
        task: &str,
    ) -> Result<BranchOutput, PatternError> {
        let output = self
            .client
            .complete(&[Message::user(subtask.prompt.replace("{task}", task))])
            .await
            .map_err(PatternError::step(&subtask.name))?;

        Ok(BranchOutput {
            name: subtask.name.clone(),
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopcraft_llm::testing::ScriptedClient;
    use loopcraft_llm::LlmError;

    #[tokio::test]
    async fn all_branches_feed_the_synthesis() {
        let client = ScriptedClient::replying(&["alpha", "beta", "gamma", "merged result"]);
        let fanout = FanOut::new(&client)
            .subtask("trends", "List trends for: {task}")
            .subtask("risks", "List risks for: {task}")
            .subtask("actions", "List actions for: {task}");

        let result = fanout.run("AI adoption report").await.unwrap();

        assert_eq!(result.merged, "merged result");
        assert_eq!(result.branches.len(), 3);
        assert_eq!(client.call_count(), 4);

        // The synthesis call is last and carries every branch output,
        // whatever order the branches were scheduled in.
        let calls = client.calls();
        let synthesis = &calls[3][1].content;
        for reply in ["alpha", "beta", "gamma"] {
            assert!(synthesis.contains(reply));
        }
        assert!(synthesis.contains("## trends"));
    }

    #[tokio::test]
    async fn branch_failure_fails_the_fan_out() {
        let client = ScriptedClient::new(vec![
            Ok("alpha".into()),
            Err(LlmError::RateLimited("busy".into())),
        ]);
        let fanout = FanOut::new(&client)
            .subtask("a", "{task}")
            .subtask("b", "{task}");

        assert!(fanout.run("task").await.is_err());
    }

    #[tokio::test]
    async fn branch_prompts_receive_the_task() {
        let client = ScriptedClient::replying(&["one", "merged"]);
        let fanout = FanOut::new(&client).subtask("solo", "Expand on: {task}");

        fanout.run("quantum computing").await.unwrap();

        let calls = client.calls();
        assert!(calls[0][0].content.contains("quantum computing"));
    }
}
