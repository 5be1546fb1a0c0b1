//! Audio frame types exchanged between the capture boundary and the engine.

use serde::{Deserialize, Serialize};

/// Which physical stream a frame or transcript fragment came from.
///
/// Input is the microphone, output is loopback of the system audio. The two
/// streams are segmented independently with different silence tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    Input,
    Output,
}

impl std::fmt::Display for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioSource::Input => write!(f, "input"),
            AudioSource::Output => write!(f, "output"),
        }
    }
}

/// One chunk of 16-bit PCM from a capture stream.
///
/// Frames are ephemeral: they are moved into the analyzer, reduced to a
/// [`FrameAnalysis`], and dropped.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub source: AudioSource,
    pub samples: Vec<i16>,
}

impl AudioFrame {
    pub fn new(source: AudioSource, samples: Vec<i16>) -> Self {
        Self { source, samples }
    }
}

/// Result of analyzing one frame: loudness and the speech decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnalysis {
    pub source: AudioSource,
    pub percent: f32,
    pub is_speech: bool,
}
