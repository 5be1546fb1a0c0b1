//! Engine configuration.
//!
//! Configuration comes from a YAML file with environment variable
//! overrides on top; every field has a default so an empty file (or none
//! at all) yields a working engine. Durable key-path settings live in
//! [`settings`].

pub mod settings;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::modes::ModeKind;
use crate::core::question::SilenceWatcherConfig;
use crate::core::vad::VadEngineConfig;
use crate::errors::ConfigError;

pub use settings::{JsonFileStore, MemoryStore, SettingsStore};

/// Default system prompt handed to the LLM with every question.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a concise assistant for live technical \
interviews. Answer the candidate's question directly, in a few short paragraphs, \
with code only when asked.";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Active mode at startup.
    pub mode: ModeKind,
    /// LLM provider name, resolved against the registry at use time.
    pub llm_provider: String,
    /// System prompt for LLM requests.
    pub system_prompt: String,
    /// Voice activity detection tuning.
    pub vad: VadEngineConfig,
    /// Per-source silence timeouts.
    pub silence: SilenceWatcherConfig,
    /// RMS noise floor for the loudness calculation.
    pub noise_floor_rms: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: ModeKind::Interview,
            llm_provider: "openai".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            vad: VadEngineConfig::default(),
            silence: SilenceWatcherConfig::default(),
            noise_floor_rms: crate::core::audio::DEFAULT_NOISE_FLOOR_RMS,
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file, then apply environment overrides and
    /// validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EngineConfig =
            serde_yaml::from_str(&contents).map_err(|err| ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables override file values:
    /// `COLLOQUY_MODE` and `COLLOQUY_LLM_PROVIDER`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("COLLOQUY_MODE") {
            match mode.parse::<ModeKind>() {
                Ok(parsed) => self.mode = parsed,
                Err(err) => warn!(value = %mode, error = %err, "ignoring COLLOQUY_MODE"),
            }
        }
        if let Ok(provider) = std::env::var("COLLOQUY_LLM_PROVIDER") {
            if !provider.trim().is_empty() {
                self.llm_provider = provider;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode_out_of_range() {
            return Err(ConfigError::Invalid(format!(
                "vad.mode must be 0-3, got {}",
                self.vad.mode
            )));
        }
        if self.vad.window_size == 0 {
            return Err(ConfigError::Invalid(
                "vad.window_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.vad.volume_threshold) {
            return Err(ConfigError::Invalid(format!(
                "vad.volume_threshold must be within 0-100, got {}",
                self.vad.volume_threshold
            )));
        }
        if self.silence.input_timeout_ms == 0 || self.silence.output_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "silence timeouts must be non-zero".to_string(),
            ));
        }
        if self.llm_provider.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm_provider must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn mode_out_of_range(&self) -> bool {
        self.vad.mode > 3
    }
}
