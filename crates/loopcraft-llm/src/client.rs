use async_trait::async_trait;

use crate::error::LlmError;
use crate::message::Message;

/// The narrow model-call contract the rest of the workspace depends on.
///
/// One operation: send a transcript, get assistant text back. Implementations
/// own their transport, credentials and retry policy.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Human-readable identifier, used in logs (typically the model name).
    fn name(&self) -> &str;

    /// Run one completion over the given transcript.
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;
}
