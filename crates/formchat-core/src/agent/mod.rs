//! The LLM completion boundary.
//!
//! The core never talks to a model directly. Everything it needs is the
//! assistant's raw text for a replayed conversation.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::ChatMessage;

/// Produces the next assistant message for a conversation.
#[async_trait]
pub trait CompletionAgent: Send + Sync {
    /// Sends the full history (system message first) and returns the reply text.
    ///
    /// Transport failures, non-success responses and empty replies are
    /// reported as `FormChatError::Collaborator`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Short identifier for logs.
    fn name(&self) -> &str {
        "completion-agent"
    }
}
