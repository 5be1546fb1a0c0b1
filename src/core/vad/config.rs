//! Configuration for the voice activity detection engine.

use serde::{Deserialize, Serialize};

/// Tuning knobs for [`VadEngine`](super::VadEngine).
///
/// Every field has a sensible default and can be overridden independently.
///
/// # Example
///
/// ```
/// use colloquy::core::vad::VadEngineConfig;
///
/// let config = VadEngineConfig::default()
///     .with_volume_threshold(25.0)
///     .with_window_size(8);
/// assert_eq!(config.window_size, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadEngineConfig {
    /// Native detector aggressiveness, 0 (lenient) to 3 (most aggressive).
    pub mode: u8,

    /// Duration of one native sub-frame in seconds. The native detector
    /// only accepts 10/20/30 ms frames; the default 30 ms at 16 kHz yields
    /// 480-sample sub-frames.
    pub frame_duration_secs: f32,

    /// Capacity of the sliding window used by the volume fallback.
    pub window_size: usize,

    /// Volume fallback threshold: mean window loudness (percent) above
    /// which a frame counts as speech.
    pub volume_threshold: f32,

    /// Frame-local energy fallback threshold, on the raw 16-bit PCM scale.
    pub energy_threshold: f32,

    /// Sample rate of incoming PCM in Hz.
    pub sample_rate: u32,
}

impl Default for VadEngineConfig {
    fn default() -> Self {
        Self {
            mode: 2,
            frame_duration_secs: 0.03,
            window_size: 6,
            volume_threshold: 20.0,
            energy_threshold: 500.0,
            sample_rate: 16_000,
        }
    }
}

impl VadEngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native sub-frame size in samples for the configured rate.
    pub fn frame_size(&self) -> usize {
        (self.sample_rate as f32 * self.frame_duration_secs) as usize
    }

    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode.min(3);
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    pub fn with_volume_threshold(mut self, percent: f32) -> Self {
        self.volume_threshold = percent.clamp(0.0, 100.0);
        self
    }

    pub fn with_energy_threshold(mut self, energy: f32) -> Self {
        self.energy_threshold = energy.max(0.0);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}

/// Partial update applied at runtime without reconstructing the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VadConfigUpdate {
    pub volume_threshold: Option<f32>,
    pub energy_threshold: Option<f32>,
    pub window_size: Option<usize>,
}

/// Diagnostic snapshot of the engine reported by
/// [`VadEngine::status`](super::VadEngine::status).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VadStatus {
    pub native_available: bool,
    pub native_enabled: bool,
    pub mode: u8,
    pub volume_threshold: f32,
    pub energy_threshold: f32,
    pub window_size: usize,
    pub sample_rate: u32,
}
