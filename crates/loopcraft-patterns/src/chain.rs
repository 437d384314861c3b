//! Sequential prompt chaining: divide a task into focused steps and feed
//! each step's output into the next step's prompt.

use serde::Serialize;
use tracing::debug;

use loopcraft_llm::{ChatClient, Message};

use crate::error::PatternError;

/// One step of a chain. The template's `{input}` placeholder receives the
/// previous step's output (or the chain input for the first step).
#[derive(Debug, Clone)]
pub struct ChainStep {
    pub name: String,
    pub template: String,
}

impl ChainStep {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    fn render(&self, input: &str) -> String {
        self.template.replace("{input}", input)
    }
}

/// Output of one completed step, kept for display and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub output: String,
}

/// Final chain output plus the per-step transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ChainOutput {
    pub output: String,
    pub transcript: Vec<StepRecord>,
}

/// A linear pipeline of prompts.
pub struct PromptChain<'a> {
    client: &'a dyn ChatClient,
    steps: Vec<ChainStep>,
}

impl<'a> PromptChain<'a> {
    pub fn new(client: &'a dyn ChatClient) -> Self {
        Self {
            client,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.steps.push(ChainStep::new(name, template));
        self
    }

    /// Run every step in order. A failed step aborts the chain and names
    /// the step that failed.
    pub async fn run(&self, input: &str) -> Result<ChainOutput, PatternError> {
        let mut current = input.to_string();
        let mut transcript = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            debug!(step = %step.name, "Running chain step");
            let messages = [Message::user(step.render(&current))];
            let output = self
                .client
                .complete(&messages)
                .await
                .map_err(PatternError::step(&step.name))?;

            transcript.push(StepRecord {
                name: step.name.clone(),
                output: output.clone(),
            });
            current = output;
        }

        Ok(ChainOutput {
            output: current,
            transcript,
        })
    }
}
