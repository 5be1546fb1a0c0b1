//! Mode mediator and per-mode strategies.
//!
//! The mediator observes four trigger points (silence-or-user finalize,
//! question finalized, answer stream end, question click) and forwards each
//! to the active strategy. Strategies express policy only; they never touch
//! providers directly - side effects are queued as [`ModeAction`]s for the
//! session to execute. A failing strategy callback is logged at the
//! mediator and never reaches the audio pipeline.

pub mod strategies;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::question::{FinalizeReason, InterviewState, QuestionId};
use crate::errors::ConfigError;
use crate::events::EventBus;

pub use strategies::{InterviewStrategy, StandardStrategy};

/// The closed set of operating modes. Exactly one is active at a time;
/// switching modes does not clear history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    #[serde(rename = "INTERVIEW")]
    Interview,
    #[serde(rename = "STANDARD")]
    Standard,
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeKind::Interview => write!(f, "INTERVIEW"),
            ModeKind::Standard => write!(f, "STANDARD"),
        }
    }
}

impl std::str::FromStr for ModeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INTERVIEW" => Ok(ModeKind::Interview),
            "STANDARD" => Ok(ModeKind::Standard),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Trigger data handed to `should_finalize_on_silence`.
#[derive(Debug, Clone)]
pub struct FinalizeSignal<'a> {
    pub reason: FinalizeReason,
    pub text: &'a str,
    pub mode: ModeKind,
}

/// Payload for the question-finalized trigger.
#[derive(Debug, Clone)]
pub struct QuestionFinalized {
    pub question_id: QuestionId,
    pub turn_id: u64,
}

/// Payload for the answer-stream-end trigger.
#[derive(Debug, Clone)]
pub struct AnswerStreamEnd {
    pub question_id: QuestionId,
}

/// Payload for the question-click trigger.
#[derive(Debug, Clone)]
pub struct QuestionClick {
    pub question_id: QuestionId,
}

/// Deferred side effect requested by a strategy, executed by the session
/// after the synchronous state transition completes.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeAction {
    AskLlm(QuestionId),
}

/// Mutable view of the session handed to strategy callbacks.
pub struct ModeContext<'a> {
    pub state: &'a mut InterviewState,
    pub bus: &'a EventBus,
    pub actions: &'a mut Vec<ModeAction>,
}

/// Policy hooks for one mode. Optional hooks default to safe behavior:
/// doing nothing, and permitting re-asks.
pub trait ModeStrategy: Send + Sync {
    fn kind(&self) -> ModeKind;

    /// Whether a silence trigger should finalize the current question.
    fn should_finalize_on_silence(&self, signal: &FinalizeSignal<'_>) -> bool;

    /// Called after a question was promoted to history.
    fn on_question_finalized(
        &self,
        ctx: &mut ModeContext<'_>,
        data: &QuestionFinalized,
    ) -> anyhow::Result<()>;

    fn on_answer_stream_end(
        &self,
        _ctx: &mut ModeContext<'_>,
        _data: &AnswerStreamEnd,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_question_click(
        &self,
        _ctx: &mut ModeContext<'_>,
        _data: &QuestionClick,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether an already-answered question may be asked again. Permitting
    /// is the safe default absent a strategy opinion.
    fn can_re_ask(&self, _ctx: &ModeContext<'_>, _question_id: &QuestionId) -> bool {
        true
    }
}

/// Routes trigger events to the active mode's strategy.
pub struct ModeMediator {
    active: ModeKind,
    strategies: HashMap<ModeKind, Box<dyn ModeStrategy>>,
}

impl ModeMediator {
    /// Mediator with both built-in strategies registered.
    pub fn with_defaults(initial: ModeKind) -> Self {
        let mut mediator = Self {
            active: initial,
            strategies: HashMap::new(),
        };
        mediator.register(Box::new(InterviewStrategy));
        mediator.register(Box::new(StandardStrategy));
        mediator
    }

    /// Register (or replace) the strategy for its mode.
    pub fn register(&mut self, strategy: Box<dyn ModeStrategy>) {
        self.strategies.insert(strategy.kind(), strategy);
    }

    pub fn mode(&self) -> ModeKind {
        self.active
    }

    pub fn is(&self, kind: ModeKind) -> bool {
        self.active == kind
    }

    pub fn set_mode(&mut self, kind: ModeKind) -> Result<(), ConfigError> {
        if !self.strategies.contains_key(&kind) {
            return Err(ConfigError::UnknownMode(kind.to_string()));
        }
        self.active = kind;
        Ok(())
    }

    fn active_strategy(&self) -> Option<&dyn ModeStrategy> {
        self.strategies.get(&self.active).map(|s| s.as_ref())
    }

    pub fn should_finalize_on_silence(&self, signal: &FinalizeSignal<'_>) -> bool {
        self.active_strategy()
            .map_or(true, |s| s.should_finalize_on_silence(signal))
    }

    pub fn question_finalized(&self, ctx: &mut ModeContext<'_>, data: &QuestionFinalized) {
        if let Some(strategy) = self.active_strategy() {
            if let Err(err) = strategy.on_question_finalized(ctx, data) {
                warn!(mode = %self.active, error = %err, "on_question_finalized failed");
            }
        }
    }

    pub fn answer_stream_end(&self, ctx: &mut ModeContext<'_>, data: &AnswerStreamEnd) {
        if let Some(strategy) = self.active_strategy() {
            if let Err(err) = strategy.on_answer_stream_end(ctx, data) {
                warn!(mode = %self.active, error = %err, "on_answer_stream_end failed");
            }
        }
    }

    pub fn question_click(&self, ctx: &mut ModeContext<'_>, data: &QuestionClick) {
        if let Some(strategy) = self.active_strategy() {
            if let Err(err) = strategy.on_question_click(ctx, data) {
                warn!(mode = %self.active, error = %err, "on_question_click failed");
            }
        }
    }

    pub fn can_re_ask(&self, ctx: &ModeContext<'_>, question_id: &QuestionId) -> bool {
        self.active_strategy()
            .map_or(true, |s| s.can_re_ask(ctx, question_id))
    }
}
