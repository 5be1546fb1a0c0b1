//! Crate-level error taxonomy.
//!
//! Validation failures are user-visible and recoverable; configuration
//! failures are hard errors raised at registration or load time. Provider
//! errors live next to their traits (`LlmError`, `CaptureError`) and are
//! surfaced through the event bus rather than propagated.

use std::path::PathBuf;

/// Rejections produced while validating a question before LLM submission.
///
/// None of these corrupt state: the current question and history are left
/// exactly as they were when the validation ran.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty question - nothing to send to the LLM")]
    EmptyQuestion,
    #[error("Question already sent")]
    DuplicateQuestion,
    #[error("That question has already been answered")]
    AlreadyAnswered,
}

/// Configuration errors: unknown registry names, bad key paths, unreadable
/// or unparsable config files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown provider: {name}. Registered providers: {available}")]
    UnknownProvider { name: String, available: String },
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
    #[error("Invalid settings key path: {0}")]
    InvalidKeyPath(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages_are_user_facing() {
        assert_eq!(
            ValidationError::EmptyQuestion.to_string(),
            "Empty question - nothing to send to the LLM"
        );
        assert_eq!(
            ValidationError::DuplicateQuestion.to_string(),
            "Question already sent"
        );
    }

    #[test]
    fn unknown_provider_lists_available() {
        let err = ConfigError::UnknownProvider {
            name: "nope".to_string(),
            available: "openai, gemini".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("openai, gemini"));
    }
}
