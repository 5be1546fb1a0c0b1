//! Per-frame audio analysis: loudness plus the speech decision.
//!
//! Analysis runs on a dedicated thread, isolated from the main engine loop;
//! frames come in over a channel and [`FrameAnalysis`] messages go out over
//! another. No state is shared with the session - the thread owns its
//! engine outright.

use tracing::{debug, info};

use super::frame::{AudioFrame, FrameAnalysis};
use super::volume;
use crate::core::vad::{VadEngine, VadEngineConfig};

/// Configuration for [`AudioAnalyzer`].
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub vad: VadEngineConfig,
    /// RMS floor for the loudness calculation; defaults to
    /// [`volume::DEFAULT_NOISE_FLOOR_RMS`] when zero/unset.
    pub noise_floor_rms: f32,
}

impl AnalyzerConfig {
    fn noise_floor(&self) -> f32 {
        if self.noise_floor_rms > 0.0 {
            self.noise_floor_rms
        } else {
            volume::DEFAULT_NOISE_FLOOR_RMS
        }
    }
}

/// Reduces raw PCM frames to loudness + speech decisions.
pub struct AudioAnalyzer {
    vad: VadEngine,
    noise_floor_rms: f32,
}

impl AudioAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let noise_floor_rms = config.noise_floor();
        Self {
            vad: VadEngine::new(config.vad),
            noise_floor_rms,
        }
    }

    pub fn analyze(&mut self, frame: &AudioFrame) -> FrameAnalysis {
        let rms = volume::pcm16_rms(&frame.samples);
        let percent = volume::volume_percent(rms, self.noise_floor_rms);
        let is_speech = self.vad.detect_speech(&frame.samples, percent);
        FrameAnalysis {
            source: frame.source,
            percent,
            is_speech,
        }
    }

    pub fn vad(&self) -> &VadEngine {
        &self.vad
    }

    pub fn vad_mut(&mut self) -> &mut VadEngine {
        &mut self.vad
    }
}

/// Spawn the analyzer thread.
///
/// Reads frames until the sender side hangs up, forwarding one analysis per
/// frame in arrival order. The engine is constructed inside the thread so
/// the native detector never crosses a thread boundary.
pub fn spawn_analyzer(
    config: AnalyzerConfig,
    frames: std::sync::mpsc::Receiver<AudioFrame>,
    analyses: tokio::sync::mpsc::Sender<FrameAnalysis>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut analyzer = AudioAnalyzer::new(config);
        info!(
            sample_rate = analyzer.vad().config().sample_rate,
            "audio analyzer started"
        );
        while let Ok(frame) = frames.recv() {
            let analysis = analyzer.analyze(&frame);
            if analyses.blocking_send(analysis).is_err() {
                break;
            }
        }
        debug!("audio analyzer stopped: frame channel closed");
    })
}
