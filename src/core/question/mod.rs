//! Question lifecycle: interview state, transcript consolidation, and
//! silence tracking.
//!
//! A question moves `Idle -> Accumulating -> PendingFinalization ->
//! Finalized -> Idle`; the session manager drives the transitions, the
//! types here hold the state.

pub mod lifecycle;
pub mod silence;
pub mod state;

pub use lifecycle::{FinalizeReason, consolidate, finalize_text, normalize_for_compare, strip_fillers};
pub use silence::{
    SILENCE_TIMEOUT_INPUT_MS, SILENCE_TIMEOUT_OUTPUT_MS, SilenceTrigger, SilenceWatcher,
    SilenceWatcherConfig,
};
pub use state::{
    CurrentQuestion, CurrentQuestionView, HistoryQuestion, HistoryQuestionView, InterviewState,
    QuestionId, QuestionPhase, TranscriptionMetrics,
};
