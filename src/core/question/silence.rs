//! Silence tracking per audio source.
//!
//! The watcher turns per-frame speech decisions into one-shot silence
//! triggers: after a source goes quiet for longer than its timeout, a
//! single [`SilenceTrigger`] fires and nothing more until speech resumes.
//! Microphone input uses a tighter timeout than system output - output
//! audio segmentation tolerates more latency.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::audio::AudioSource;

/// Silence timeout for microphone input.
pub const SILENCE_TIMEOUT_INPUT_MS: u64 = 500;
/// Silence timeout for system/output audio.
pub const SILENCE_TIMEOUT_OUTPUT_MS: u64 = 700;

/// Timeouts for [`SilenceWatcher`], one per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceWatcherConfig {
    pub input_timeout_ms: u64,
    pub output_timeout_ms: u64,
}

impl Default for SilenceWatcherConfig {
    fn default() -> Self {
        Self {
            input_timeout_ms: SILENCE_TIMEOUT_INPUT_MS,
            output_timeout_ms: SILENCE_TIMEOUT_OUTPUT_MS,
        }
    }
}

/// One-shot notification that a source has been silent past its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceTrigger {
    pub source: AudioSource,
    pub elapsed_ms: u64,
}

#[derive(Debug, Default)]
struct SourceState {
    last_active: Option<Instant>,
    in_silence: bool,
}

/// Tracks stable silence per audio source.
#[derive(Debug, Default)]
pub struct SilenceWatcher {
    config: SilenceWatcherConfig,
    input: SourceState,
    output: SourceState,
}

impl SilenceWatcher {
    pub fn new(config: SilenceWatcherConfig) -> Self {
        Self {
            config,
            input: SourceState::default(),
            output: SourceState::default(),
        }
    }

    fn timeout_ms(&self, source: AudioSource) -> u64 {
        match source {
            AudioSource::Input => self.config.input_timeout_ms,
            AudioSource::Output => self.config.output_timeout_ms,
        }
    }

    fn state_mut(&mut self, source: AudioSource) -> &mut SourceState {
        match source {
            AudioSource::Input => &mut self.input,
            AudioSource::Output => &mut self.output,
        }
    }

    fn state(&self, source: AudioSource) -> &SourceState {
        match source {
            AudioSource::Input => &self.input,
            AudioSource::Output => &self.output,
        }
    }

    /// Feed one speech decision for a source.
    ///
    /// Returns a trigger exactly once per stable-silence episode; speech
    /// rearms the trigger and restarts the clock.
    pub fn observe(
        &mut self,
        source: AudioSource,
        is_speech: bool,
        now: Instant,
    ) -> Option<SilenceTrigger> {
        let timeout_ms = self.timeout_ms(source);
        let state = self.state_mut(source);

        if is_speech {
            if state.in_silence {
                debug!(%source, "speech resumed after stable silence");
            }
            state.in_silence = false;
            state.last_active = Some(now);
            return None;
        }

        // Silence: start counting from the first observation if no speech
        // has been seen yet on this source.
        let last_active = *state.last_active.get_or_insert(now);
        let elapsed_ms = now.duration_since(last_active).as_millis() as u64;

        if elapsed_ms >= timeout_ms && !state.in_silence {
            state.in_silence = true;
            debug!(%source, elapsed_ms, "stable silence detected");
            return Some(SilenceTrigger { source, elapsed_ms });
        }

        None
    }

    /// Whether a source is currently in stable silence.
    pub fn in_silence(&self, source: AudioSource) -> bool {
        self.state(source).in_silence
    }

    pub fn reset_source(&mut self, source: AudioSource) {
        *self.state_mut(source) = SourceState::default();
    }

    pub fn reset(&mut self) {
        self.input = SourceState::default();
        self.output = SourceState::default();
    }

    pub fn config(&self) -> &SilenceWatcherConfig {
        &self.config
    }
}
