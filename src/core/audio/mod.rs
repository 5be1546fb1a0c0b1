//! Audio frame types, loudness calculation, and the analyzer pipeline.

pub mod analyzer;
pub mod frame;
pub mod volume;

pub use analyzer::{AnalyzerConfig, AudioAnalyzer, spawn_analyzer};
pub use frame::{AudioFrame, AudioSource, FrameAnalysis};
pub use volume::{DEFAULT_NOISE_FLOOR_RMS, frame_rms, pcm16_energy, pcm16_rms, volume_percent};
