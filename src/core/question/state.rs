//! Interview state: the in-progress question, the history, and the
//! counters that identify turns and questions.
//!
//! All mutation happens on the session task; the audio side only sends
//! messages. Nothing here locks.

use std::collections::HashSet;

/// Identifier for a question in UI-facing flows.
///
/// `Current` is the sentinel for the in-progress, not-yet-finalized
/// question; `History` carries the permanent id assigned at promotion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionId {
    Current,
    History(String),
}

impl QuestionId {
    pub fn is_current(&self) -> bool {
        matches!(self, QuestionId::Current)
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionId::Current => write!(f, "CURRENT"),
            QuestionId::History(id) => write!(f, "{id}"),
        }
    }
}

/// Where the in-progress question sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionPhase {
    /// No current question.
    #[default]
    Idle,
    /// Interim/final fragments are arriving.
    Accumulating,
    /// Silence or a user action was observed; awaiting strategy approval.
    PendingFinalization,
    /// Promoted to history; cleared back to `Idle` immediately after.
    Finalized,
}

/// The question being spoken right now.
///
/// `final_text` accumulates confirmed fragments, `interim_text` holds the
/// latest provisional fragment, and `text` is the consolidated view of
/// both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentQuestion {
    pub text: String,
    pub interim_text: String,
    pub final_text: String,
    pub created_at_ms: Option<u64>,
    pub last_update_ms: Option<u64>,
    pub finalized: bool,
    pub promoted_to_history: bool,
    pub turn_id: Option<u64>,
    pub phase: QuestionPhase,
}

impl CurrentQuestion {
    /// Reset back to the empty template.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A question promoted into history. Immutable after creation except for
/// the `answered` mark.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuestion {
    pub id: String,
    pub text: String,
    pub turn_id: u64,
    pub created_at_ms: u64,
    pub last_update_ms: u64,
    pub answered: bool,
    /// Set when the question was cut off mid-utterance (finalized while an
    /// interim fragment was still pending).
    pub incomplete: bool,
}

/// UI snapshot of one history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuestionView {
    pub id: String,
    pub text: String,
    pub turn_id: u64,
    pub is_answered: bool,
    pub is_selected: bool,
    pub is_incomplete: bool,
}

/// UI snapshot of the in-progress question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentQuestionView {
    pub text: String,
    pub is_selected: bool,
}

/// Latency bookkeeping for one LLM round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TranscriptionMetrics {
    pub llm_start_ms: Option<u64>,
    pub llm_first_token_ms: Option<u64>,
    pub llm_end_ms: Option<u64>,
    pub total_ms: Option<u64>,
}

impl TranscriptionMetrics {
    pub fn record_start(&mut self, now_ms: u64) {
        self.llm_start_ms = Some(now_ms);
        self.llm_first_token_ms = None;
        self.llm_end_ms = None;
        self.total_ms = None;
    }

    pub fn record_first_token(&mut self, now_ms: u64) {
        if self.llm_first_token_ms.is_none() {
            self.llm_first_token_ms = Some(now_ms);
        }
    }

    pub fn record_end(&mut self, now_ms: u64) {
        self.llm_end_ms = Some(now_ms);
        if let Some(start) = self.llm_start_ms {
            self.total_ms = Some(now_ms.saturating_sub(start));
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The complete question/turn state for one session.
#[derive(Debug, Default)]
pub struct InterviewState {
    pub current: CurrentQuestion,
    pub history: Vec<HistoryQuestion>,
    answered: HashSet<String>,
    pub selected: Option<QuestionId>,
    /// Monotonic turn counter; a fresh turn id is taken when a new current
    /// question opens.
    pub interview_turn_id: u64,
    /// Total questions promoted this session; history ids derive from it.
    pub question_counter: u64,
    pub llm_requested_turn: Option<u64>,
    pub llm_answered_turn: Option<u64>,
    pub llm_requested_question: Option<QuestionId>,
    pub last_asked_normalized: Option<String>,
}

impl InterviewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the in-progress question back to its template.
    pub fn reset_current(&mut self) {
        self.current.clear();
    }

    /// Full-session reset: current question, history (cleared in place so
    /// external holders of the container stay valid), answered set, and
    /// both counters, in one synchronous pass with no suspension points.
    pub fn reset(&mut self) {
        self.current.clear();
        self.history.clear();
        self.answered.clear();
        self.selected = None;
        self.interview_turn_id = 0;
        self.question_counter = 0;
        self.llm_requested_turn = None;
        self.llm_answered_turn = None;
        self.llm_requested_question = None;
        self.last_asked_normalized = None;
    }

    pub fn push_history(&mut self, question: HistoryQuestion) {
        self.history.push(question);
    }

    pub fn find(&self, id: &str) -> Option<&HistoryQuestion> {
        self.history.iter().find(|q| q.id == id)
    }

    /// Mark a history question as answered.
    pub fn mark_answered(&mut self, id: &str) {
        self.answered.insert(id.to_string());
        if let Some(question) = self.history.iter_mut().find(|q| q.id == id) {
            question.answered = true;
        }
    }

    pub fn has_answered(&self, id: &str) -> bool {
        self.answered.contains(id)
    }

    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    /// Ids in UI navigation order: CURRENT first (when open), then history
    /// newest to oldest.
    pub fn navigable_ids(&self) -> Vec<QuestionId> {
        let mut ids = Vec::with_capacity(self.history.len() + 1);
        if !self.current.is_empty() {
            ids.push(QuestionId::Current);
        }
        for question in self.history.iter().rev() {
            ids.push(QuestionId::History(question.id.clone()));
        }
        ids
    }

    pub fn history_view(&self) -> Vec<HistoryQuestionView> {
        self.history
            .iter()
            .map(|q| HistoryQuestionView {
                id: q.id.clone(),
                text: q.text.clone(),
                turn_id: q.turn_id,
                is_answered: self.answered.contains(&q.id),
                is_selected: self.selected == Some(QuestionId::History(q.id.clone())),
                is_incomplete: q.incomplete || q.text.trim().is_empty(),
            })
            .collect()
    }

    pub fn current_view(&self) -> CurrentQuestionView {
        CurrentQuestionView {
            text: self.current.text.clone(),
            is_selected: self.selected == Some(QuestionId::Current),
        }
    }
}
