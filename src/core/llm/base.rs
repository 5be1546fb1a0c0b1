//! Provider-agnostic LLM handler contract.
//!
//! The core treats every provider identically through this shape: a
//! token-streaming call and a single-shot completion call. Concrete SDK
//! bindings live outside the crate and are registered by name.

use serde::{Deserialize, Serialize};

/// Chat role for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Error types for LLM operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// Ordered stream of answer tokens.
///
/// Channel delivery preserves generation order; the consumer concatenates
/// tokens into an accumulator, so no reordering is tolerated.
pub type TokenReceiver = tokio::sync::mpsc::Receiver<Result<String, LlmError>>;

/// Base trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmHandler: Send + Sync {
    /// Start a streaming completion. Tokens arrive on the returned channel
    /// in generation order; the channel closes when the answer is complete.
    async fn stream(&self, messages: &[ChatMessage]) -> Result<TokenReceiver, LlmError>;

    /// Run a single-shot completion.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Short provider identifier for diagnostics.
    fn provider_info(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn llm_error_messages_are_prefixed() {
        assert_eq!(
            LlmError::ProviderError("quota".to_string()).to_string(),
            "Provider error: quota"
        );
    }
}
