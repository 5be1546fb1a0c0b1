//! LLM handler contract, provider registry, and dispatch.

pub mod base;
pub mod dispatch;
pub mod registry;

pub use base::{ChatMessage, LlmError, LlmHandler, Role, TokenReceiver};
pub use dispatch::{ValidatedRequest, batch_answer, stream_answer, validate_request};
pub use registry::LlmRegistry;
