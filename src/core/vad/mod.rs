//! Voice activity detection.
//!
//! [`VadEngine`] prefers a native WebRTC detector and falls back to a
//! window-smoothed volume heuristic when the detector is unavailable,
//! disabled, or failing. See [`engine`] for the decision tiers.

pub mod config;
pub mod engine;

pub use config::{VadConfigUpdate, VadEngineConfig, VadStatus};
pub use engine::{NativeVad, NativeVadError, VadEngine, probe_native_vad};
