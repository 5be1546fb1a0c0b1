//! # colloquy
//!
//! Core engine of a voice-driven interview assistant: VAD-based audio
//! segmentation, a question-lifecycle state machine with silence-driven
//! finalization and deduplication, per-mode answering policy, and LLM
//! dispatch.
//!
//! The crate deliberately owns no UI, no provider SDKs, and no capture
//! devices - those are consumed through the narrow traits in
//! [`core::capture`] and [`core::llm`], and everything the engine decides
//! flows out through the typed [`events::EventBus`].

pub mod config;
pub mod core;
pub mod errors;
pub mod events;

// Re-export commonly used items for convenient access
pub use config::{EngineConfig, JsonFileStore, MemoryStore, SettingsStore};
pub use core::session::{SessionError, SessionManager};
pub use errors::{ConfigError, ValidationError};
pub use events::{Event, EventBus, EventKind, SubscriptionId};
