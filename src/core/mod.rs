pub mod audio;
pub mod capture;
pub mod llm;
pub mod modes;
pub mod question;
pub mod session;
pub mod vad;
pub(crate) mod util;

// Re-export commonly used types for convenience
pub use audio::{AudioFrame, AudioSource, FrameAnalysis};
pub use capture::{CaptureBackend, CaptureError, CaptureRegistry, Speaker, TranscriptFragment, UiHints};
pub use llm::{ChatMessage, LlmError, LlmHandler, LlmRegistry, TokenReceiver};
pub use modes::{ModeAction, ModeKind, ModeMediator, ModeStrategy};
pub use question::{
    CurrentQuestion, HistoryQuestion, InterviewState, QuestionId, QuestionPhase, SilenceWatcher,
    SilenceWatcherConfig,
};
pub use session::{SessionError, SessionManager};
pub use vad::{VadEngine, VadEngineConfig};
