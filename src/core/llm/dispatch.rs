//! LLM request validation and execution.
//!
//! Validation rejects empty, duplicate, and already-answered questions
//! before any provider is touched. Execution routes by application mode:
//! a token-streaming path that emits one event per token plus a final
//! aggregate, or a single-shot batch path. Provider failures surface as a
//! single user-facing error event; the underlying error never crosses the
//! dispatch boundary.

use tracing::{info, warn};

use super::base::{ChatMessage, LlmError, LlmHandler};
use crate::core::question::{
    InterviewState, QuestionId, TranscriptionMetrics, normalize_for_compare,
};
use crate::core::util::now_ms;
use crate::errors::ValidationError;
use crate::events::{Event, EventBus};

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub question_id: QuestionId,
    pub text: String,
    pub is_current: bool,
}

/// Validate a question before submission.
///
/// Fails when the text is empty, when the CURRENT question's normalized
/// text matches the last submission, or when the targeted history entry
/// has already been answered. State is never mutated here.
pub fn validate_request(
    state: &InterviewState,
    question_id: &QuestionId,
    text: &str,
) -> Result<ValidatedRequest, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyQuestion);
    }

    let is_current = question_id.is_current();

    if is_current {
        let normalized = normalize_for_compare(trimmed);
        if state.last_asked_normalized.as_deref() == Some(normalized.as_str()) {
            return Err(ValidationError::DuplicateQuestion);
        }
    }

    if let QuestionId::History(id) = question_id {
        if state.has_answered(id) {
            return Err(ValidationError::AlreadyAnswered);
        }
    }

    Ok(ValidatedRequest {
        question_id: question_id.clone(),
        text: trimmed.to_string(),
        is_current,
    })
}

/// Run a streaming completion, emitting one `AnswerStreamChunk` per token
/// and a final `LlmStreamEnd`.
///
/// Returns the aggregated answer. On provider failure an `Event::Error`
/// carrying a readable message is emitted and the error is returned for
/// the caller to absorb.
pub async fn stream_answer(
    bus: &EventBus,
    handler: &dyn LlmHandler,
    metrics: &mut TranscriptionMetrics,
    question_id: &QuestionId,
    turn_id: Option<u64>,
    system_prompt: &str,
    text: &str,
) -> Result<String, LlmError> {
    info!(question_id = %question_id, provider = handler.provider_info(), "starting LLM stream");
    metrics.record_start(now_ms());

    let messages = [ChatMessage::system(system_prompt), ChatMessage::user(text)];
    let mut tokens = match handler.stream(&messages).await {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!(error = %err, "LLM stream failed to start");
            bus.emit(Event::Error(err.to_string()));
            return Err(err);
        }
    };

    let mut accum = String::new();
    while let Some(item) = tokens.recv().await {
        match item {
            Ok(token) => {
                metrics.record_first_token(now_ms());
                accum.push_str(&token);
                bus.emit(Event::AnswerStreamChunk {
                    question_id: question_id.clone(),
                    turn_id,
                    token,
                    accum: accum.clone(),
                });
            }
            Err(err) => {
                warn!(error = %err, "LLM stream failed mid-flight");
                bus.emit(Event::Error(err.to_string()));
                return Err(err);
            }
        }
    }

    metrics.record_end(now_ms());
    info!(
        question_id = %question_id,
        duration_ms = metrics.total_ms.unwrap_or(0),
        "LLM stream finished"
    );
    bus.emit(Event::LlmStreamEnd {
        question_id: question_id.clone(),
        answer: accum.clone(),
    });
    Ok(accum)
}

/// Run a single-shot completion, emitting one `LlmBatchEnd`.
pub async fn batch_answer(
    bus: &EventBus,
    handler: &dyn LlmHandler,
    metrics: &mut TranscriptionMetrics,
    question_id: &QuestionId,
    system_prompt: &str,
    text: &str,
) -> Result<String, LlmError> {
    info!(question_id = %question_id, provider = handler.provider_info(), "starting LLM batch");
    metrics.record_start(now_ms());

    let messages = [ChatMessage::system(system_prompt), ChatMessage::user(text)];
    let answer = match handler.complete(&messages).await {
        Ok(answer) => answer,
        Err(err) => {
            warn!(error = %err, "LLM batch failed");
            bus.emit(Event::Error(err.to_string()));
            return Err(err);
        }
    };

    metrics.record_end(now_ms());
    info!(
        question_id = %question_id,
        duration_ms = metrics.total_ms.unwrap_or(0),
        "LLM batch finished"
    );
    bus.emit(Event::LlmBatchEnd {
        question_id: question_id.clone(),
        answer: answer.clone(),
    });
    Ok(answer)
}
