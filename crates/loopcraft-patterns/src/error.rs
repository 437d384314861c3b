use thiserror::Error;

use loopcraft_llm::LlmError;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("model call failed in step '{step}': {source}")]
    Step {
        step: String,
        #[source]
        source: LlmError,
    },

    #[error("could not classify query into a known intent: got '{0}'")]
    UnknownIntent(String),
}

impl PatternError {
    pub(crate) fn step(step: impl Into<String>) -> impl FnOnce(LlmError) -> Self {
        let step = step.into();
        move |source| PatternError::Step { step, source }
    }
}
