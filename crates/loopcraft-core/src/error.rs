use thiserror::Error;

use loopcraft_llm::LlmError;

/// Fatal failure of one generator call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call failed: {0}")]
    Client(#[source] LlmError),

    #[error("model returned an empty artifact")]
    EmptyArtifact,
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::EmptyCompletion => GenerationError::EmptyArtifact,
            other => GenerationError::Client(other),
        }
    }
}

/// Errors that abort a refine run.
///
/// Critique failures never appear here: a degraded critique only downgrades
/// one iteration's feedback.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("generation failed on iteration {iteration}: {source}")]
    Generation {
        iteration: usize,
        #[source]
        source: GenerationError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
