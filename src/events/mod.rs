//! Publish/subscribe event bus connecting the engine core to UI and
//! configuration layers.
//!
//! This is the sole coupling mechanism between the core and its consumers:
//! named events with typed payloads, synchronous in-order delivery, and
//! explicit unsubscription. A failing handler is logged and skipped so the
//! remaining subscribers for the same emit still run.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::core::audio::AudioSource;
use crate::core::modes::ModeKind;
use crate::core::question::{CurrentQuestionView, HistoryQuestionView, QuestionId};

/// Events published by the engine.
///
/// Every variant carries its full payload; subscribers receive a shared
/// reference and must clone what they keep.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The in-progress question changed (new fragment, finalize, reset).
    CurrentQuestionChanged(CurrentQuestionView),
    /// The question history changed (promotion, answer, reset).
    QuestionsHistoryChanged(Vec<HistoryQuestionView>),
    /// A question was selected whose answer already exists.
    AnswerSelected { question_id: QuestionId },
    /// One streamed LLM token, plus the accumulated answer so far.
    AnswerStreamChunk {
        question_id: QuestionId,
        turn_id: Option<u64>,
        token: String,
        accum: String,
    },
    /// A streaming LLM response completed.
    LlmStreamEnd {
        question_id: QuestionId,
        answer: String,
    },
    /// A batch LLM response completed.
    LlmBatchEnd {
        question_id: QuestionId,
        answer: String,
    },
    /// The active mode began answering a finalized question on its own.
    ModeStartedResponding { question_id: QuestionId },
    /// The active mode changed.
    ModeChanged { mode: ModeKind },
    /// Loudness update for one audio source, 0-100.
    VolumeUpdate { source: AudioSource, percent: f32 },
    CaptureStarted,
    CaptureStopped,
    /// Full session state was reset.
    SessionReset,
    /// Human-readable status line for the UI.
    StatusMessage(String),
    /// Human-readable error surfaced from a provider or validation.
    Error(String),
}

/// Discriminant used for subscription routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CurrentQuestionChanged,
    QuestionsHistoryChanged,
    AnswerSelected,
    AnswerStreamChunk,
    LlmStreamEnd,
    LlmBatchEnd,
    ModeStartedResponding,
    ModeChanged,
    VolumeUpdate,
    CaptureStarted,
    CaptureStopped,
    SessionReset,
    StatusMessage,
    Error,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::CurrentQuestionChanged(_) => EventKind::CurrentQuestionChanged,
            Event::QuestionsHistoryChanged(_) => EventKind::QuestionsHistoryChanged,
            Event::AnswerSelected { .. } => EventKind::AnswerSelected,
            Event::AnswerStreamChunk { .. } => EventKind::AnswerStreamChunk,
            Event::LlmStreamEnd { .. } => EventKind::LlmStreamEnd,
            Event::LlmBatchEnd { .. } => EventKind::LlmBatchEnd,
            Event::ModeStartedResponding { .. } => EventKind::ModeStartedResponding,
            Event::ModeChanged { .. } => EventKind::ModeChanged,
            Event::VolumeUpdate { .. } => EventKind::VolumeUpdate,
            Event::CaptureStarted => EventKind::CaptureStarted,
            Event::CaptureStopped => EventKind::CaptureStopped,
            Event::SessionReset => EventKind::SessionReset,
            Event::StatusMessage(_) => EventKind::StatusMessage,
            Event::Error(_) => EventKind::Error,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    handler: Handler,
}

/// Synchronous pub/sub bus.
///
/// Handlers for one emit run in registration order on the emitting thread.
/// An `Err` from one handler is logged and does not stop delivery to the
/// handlers after it.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<EventKind, Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push(Subscriber {
                id,
                handler: Arc::new(handler),
            });
        debug!(?kind, "listener registered");
        id
    }

    /// Remove one handler. Returns false if it was already gone.
    pub fn off(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(list) = subscribers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        before != list.len()
    }

    /// Deliver an event to every subscriber of its kind, in order.
    pub fn emit(&self, event: Event) {
        let kind = event.kind();
        let handlers: Vec<Handler> = {
            let subscribers = self.subscribers.read();
            match subscribers.get(&kind) {
                Some(list) if !list.is_empty() => {
                    list.iter().map(|s| Arc::clone(&s.handler)).collect()
                }
                _ => {
                    debug!(?kind, "no listeners for event");
                    return;
                }
            }
        };

        for handler in handlers {
            if let Err(err) = handler(&event) {
                warn!(?kind, error = %err, "event handler failed, continuing");
            }
        }
    }

    /// Drop all subscribers for one event kind.
    pub fn clear(&self, kind: EventKind) {
        self.subscribers.write().remove(&kind);
    }

    /// Drop every subscriber.
    pub fn clear_all(&self) {
        self.subscribers.write().clear();
    }

    /// Number of subscribers currently registered for a kind.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .read()
            .get(&kind)
            .map_or(0, |list| list.len())
    }
}
