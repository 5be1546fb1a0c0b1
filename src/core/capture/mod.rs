//! Capture backend contract and provider registry.
//!
//! One implementation exists per STT provider, all conforming to the same
//! three-method shape; the core looks them up by name and treats them
//! identically. Transcript fragments flow back through
//! [`TranscriptFragment`], tagged with their source and speaker - the core
//! does not care which provider produced them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::audio::AudioSource;
use crate::errors::ConfigError;

/// Device hints passed to `start`, straight from the UI layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiHints {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub language: Option<String>,
}

/// Error types for capture operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Capture not running")]
    NotRunning,
    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Base trait for capture/transcription backends.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Begin capturing with the given device hints.
    async fn start(&mut self, hints: &UiHints) -> Result<(), CaptureError>;

    /// Stop capturing and release devices.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Swap the device backing one source without restarting the other.
    async fn switch_device(
        &mut self,
        source: AudioSource,
        device_id: &str,
    ) -> Result<(), CaptureError>;
}

/// Who produced a transcript fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The remote party; their speech forms the questions.
    Interviewer,
    /// The local user; their speech is never accumulated as a question.
    User,
}

/// One fragment of transcribed speech from any provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFragment {
    pub source: AudioSource,
    pub speaker: Speaker,
    pub text: String,
    pub is_interim: bool,
    pub timestamp_ms: u64,
}

impl TranscriptFragment {
    pub fn interim(source: AudioSource, speaker: Speaker, text: &str, timestamp_ms: u64) -> Self {
        Self {
            source,
            speaker,
            text: text.to_string(),
            is_interim: true,
            timestamp_ms,
        }
    }

    pub fn final_result(
        source: AudioSource,
        speaker: Speaker,
        text: &str,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            source,
            speaker,
            text: text.to_string(),
            is_interim: false,
            timestamp_ms,
        }
    }
}

/// Registry of capture backends keyed by provider name.
#[derive(Default)]
pub struct CaptureRegistry {
    backends: HashMap<String, Box<dyn CaptureBackend>>,
}

impl CaptureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, backend: Box<dyn CaptureBackend>) {
        let name = name.into();
        info!(provider = %name, "capture backend registered");
        self.backends.insert(name, backend);
    }

    /// Look up a backend by provider name. Unknown names are a fatal
    /// configuration error, not silently ignored.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut (dyn CaptureBackend + '_), ConfigError> {
        let available = self.provider_names().join(", ");
        match self.backends.get_mut(name) {
            Some(backend) => Ok(backend.as_mut()),
            None => Err(ConfigError::UnknownProvider {
                name: name.to_string(),
                available,
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockBackend {
        running: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl CaptureBackend for MockBackend {
        async fn start(&mut self, _hints: &UiHints) -> Result<(), CaptureError> {
            self.running.store(true, Ordering::Release);
            Ok(())
        }

        async fn stop(&mut self) -> Result<(), CaptureError> {
            if !self.running.swap(false, Ordering::AcqRel) {
                return Err(CaptureError::NotRunning);
            }
            Ok(())
        }

        async fn switch_device(
            &mut self,
            _source: AudioSource,
            device_id: &str,
        ) -> Result<(), CaptureError> {
            if device_id.is_empty() {
                return Err(CaptureError::DeviceUnavailable("empty id".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn registered_backend_round_trips_start_stop() {
        let running = Arc::new(AtomicBool::new(false));
        let mut registry = CaptureRegistry::new();
        registry.register(
            "vosk",
            Box::new(MockBackend {
                running: Arc::clone(&running),
            }),
        );

        let backend = registry.get_mut("vosk").unwrap();
        backend.start(&UiHints::default()).await.unwrap();
        assert!(running.load(Ordering::Acquire));
        backend.stop().await.unwrap();
        assert!(!running.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn switch_device_rejects_empty_id() {
        let mut registry = CaptureRegistry::new();
        registry.register(
            "vosk",
            Box::new(MockBackend {
                running: Arc::new(AtomicBool::new(false)),
            }),
        );
        let backend = registry.get_mut("vosk").unwrap();
        assert!(backend
            .switch_device(AudioSource::Input, "")
            .await
            .is_err());
        assert!(backend
            .switch_device(AudioSource::Input, "mic-2")
            .await
            .is_ok());
    }

    #[test]
    fn unknown_provider_is_a_hard_error() {
        let mut registry = CaptureRegistry::new();
        registry.register(
            "vosk",
            Box::new(MockBackend {
                running: Arc::new(AtomicBool::new(false)),
            }),
        );
        let err = registry.get_mut("deepgram").err().unwrap();
        assert!(err.to_string().contains("deepgram"));
        assert!(err.to_string().contains("vosk"));
    }

    #[test]
    fn fragment_constructors_tag_interim_flag() {
        let interim =
            TranscriptFragment::interim(AudioSource::Output, Speaker::Interviewer, "wha", 10);
        assert!(interim.is_interim);
        let final_ =
            TranscriptFragment::final_result(AudioSource::Output, Speaker::Interviewer, "what", 20);
        assert!(!final_.is_interim);
        assert_eq!(final_.timestamp_ms, 20);
    }
}
