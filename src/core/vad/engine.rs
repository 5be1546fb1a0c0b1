//! Voice activity detection with a native detector and smoothed-energy
//! fallback.
//!
//! The engine prefers the native WebRTC detector when the configured sample
//! rate supports it, and degrades per call - never by aborting audio
//! processing. Detection runs in three tiers:
//!
//! 1. Native: the frame is split into 30 ms sub-frames and the first
//!    sub-frame flagged as speech wins.
//! 2. Frame-local energy: if the native detector rejects a sub-frame, that
//!    sub-frame alone is judged by raw PCM energy.
//! 3. Window-smoothed volume: when nothing above flagged speech (or the
//!    native detector is unavailable/disabled), the frame's loudness
//!    percentage is pushed onto a sliding window and the window mean is
//!    compared against the volume threshold.

use std::collections::VecDeque;

use tracing::{debug, info, warn};
use webrtc_vad::{SampleRate, Vad, VadMode};

use super::config::{VadConfigUpdate, VadEngineConfig, VadStatus};
use crate::core::audio::volume;

/// A native per-sub-frame speech detector.
///
/// Implemented for the WebRTC detector; test code substitutes scripted
/// detectors through [`VadEngine::with_native`].
pub trait NativeVad {
    /// Decide whether one sub-frame contains speech. An error means the
    /// detector could not judge this sub-frame; the engine falls back to
    /// energy detection for it.
    fn is_speech(&mut self, frame: &[i16]) -> Result<bool, NativeVadError>;
}

/// Error raised by a native detector for a single sub-frame.
#[derive(Debug, Clone, thiserror::Error)]
#[error("native VAD error: {0}")]
pub struct NativeVadError(pub String);

/// Probe whether a native detector can be built for a sample rate.
///
/// Performed once at engine construction; the WebRTC detector only accepts
/// the four canonical telephony/wideband rates.
pub fn probe_native_vad(sample_rate: u32) -> bool {
    matches!(sample_rate, 8_000 | 16_000 | 32_000 | 48_000)
}

struct WebRtcDetector {
    inner: Vad,
}

impl WebRtcDetector {
    fn build(config: &VadEngineConfig) -> Option<Self> {
        let rate = match config.sample_rate {
            8_000 => SampleRate::Rate8kHz,
            16_000 => SampleRate::Rate16kHz,
            32_000 => SampleRate::Rate32kHz,
            48_000 => SampleRate::Rate48kHz,
            other => {
                warn!(
                    sample_rate = other,
                    "native VAD unavailable for sample rate, using volume fallback"
                );
                return None;
            }
        };
        let mode = match config.mode {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            _ => VadMode::VeryAggressive,
        };
        Some(Self {
            inner: Vad::new_with_rate_and_mode(rate, mode),
        })
    }
}

impl NativeVad for WebRtcDetector {
    fn is_speech(&mut self, frame: &[i16]) -> Result<bool, NativeVadError> {
        self.inner
            .is_voice_segment(frame)
            .map_err(|_| NativeVadError("unsupported frame length".to_string()))
    }
}

/// Per-frame speech decision engine.
///
/// Stateless per call apart from the sliding window used by the volume
/// fallback. Construction never fails: a missing native detector is logged
/// and the engine runs fallback-only.
pub struct VadEngine {
    config: VadEngineConfig,
    native: Option<Box<dyn NativeVad>>,
    native_enabled: bool,
    window: VecDeque<f32>,
}

impl VadEngine {
    pub fn new(config: VadEngineConfig) -> Self {
        let native = WebRtcDetector::build(&config)
            .map(|detector| Box::new(detector) as Box<dyn NativeVad>);
        if native.is_some() {
            info!(mode = config.mode, "native VAD initialized");
        }
        Self::with_native(config, native)
    }

    /// Build an engine with an explicit native detector (or none).
    ///
    /// The capability probe normally decides this; tests and embedders with
    /// their own detector inject here.
    pub fn with_native(config: VadEngineConfig, native: Option<Box<dyn NativeVad>>) -> Self {
        let window = VecDeque::with_capacity(config.window_size);
        Self {
            config,
            native,
            native_enabled: true,
            window,
        }
    }

    /// Decide whether one frame of PCM contains speech.
    ///
    /// `volume_percent` is the frame's precomputed loudness (0-100), used
    /// only by the fallback path.
    pub fn detect_speech(&mut self, pcm: &[i16], volume_percent: f32) -> bool {
        if self.native_enabled {
            if let Some(native) = self.native.as_mut() {
                let frame_size = self.config.frame_size();
                let energy_threshold = self.config.energy_threshold;
                if frame_size > 0 {
                    let mut start = 0;
                    while start + frame_size <= pcm.len() {
                        let sub_frame = &pcm[start..start + frame_size];
                        let speech = match native.is_speech(sub_frame) {
                            Ok(decision) => decision,
                            Err(err) => {
                                warn!(error = %err, "native VAD failed on sub-frame, using energy fallback");
                                volume::pcm16_energy(sub_frame) > energy_threshold
                            }
                        };
                        if speech {
                            return true;
                        }
                        start += frame_size;
                    }
                }
            }
        }

        // No sub-frame was flagged as speech (or native is unavailable):
        // fall back to window-smoothed volume.
        self.fallback_is_speech(volume_percent)
    }

    fn fallback_is_speech(&mut self, percent: f32) -> bool {
        self.window.push_back(percent);
        while self.window.len() > self.config.window_size {
            self.window.pop_front();
        }
        let avg: f32 = self.window.iter().sum::<f32>() / self.window.len() as f32;
        avg > self.config.volume_threshold
    }

    /// Whether the native detector is both present and enabled.
    pub fn native_active(&self) -> bool {
        self.native_enabled && self.native.is_some()
    }

    /// Force fallback mode, e.g. after repeated native failures.
    pub fn disable_native(&mut self) {
        self.native_enabled = false;
        info!("native VAD disabled, using volume fallback");
    }

    /// Re-enable the native detector if one is available.
    pub fn enable_native(&mut self) {
        if self.native.is_some() {
            self.native_enabled = true;
            info!("native VAD re-enabled");
        }
    }

    /// Hot-swap thresholds without reconstructing the engine.
    pub fn update_config(&mut self, update: VadConfigUpdate) {
        if let Some(volume_threshold) = update.volume_threshold {
            self.config.volume_threshold = volume_threshold;
        }
        if let Some(energy_threshold) = update.energy_threshold {
            self.config.energy_threshold = energy_threshold;
        }
        if let Some(window_size) = update.window_size {
            self.config.window_size = window_size.max(1);
            while self.window.len() > self.config.window_size {
                self.window.pop_front();
            }
        }
        debug!(?update, "VAD config updated");
    }

    pub fn config(&self) -> &VadEngineConfig {
        &self.config
    }

    pub fn status(&self) -> VadStatus {
        VadStatus {
            native_available: self.native.is_some(),
            native_enabled: self.native_active(),
            mode: self.config.mode,
            volume_threshold: self.config.volume_threshold,
            energy_threshold: self.config.energy_threshold,
            window_size: self.config.window_size,
            sample_rate: self.config.sample_rate,
        }
    }
}
