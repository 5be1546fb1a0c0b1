//! Built-in mode strategies.
//!
//! INTERVIEW answers every finalized question automatically, once per
//! turn, and never allows re-asking. STANDARD finalizes on silence but
//! waits for an explicit user action before answering, and allows free
//! re-querying.

use tracing::debug;

use super::{
    AnswerStreamEnd, FinalizeSignal, ModeContext, ModeKind, ModeStrategy, QuestionClick,
    QuestionFinalized,
};
use super::ModeAction;
use crate::core::question::QuestionId;
use crate::events::Event;

fn emit_question_views(ctx: &mut ModeContext<'_>) {
    ctx.bus
        .emit(Event::QuestionsHistoryChanged(ctx.state.history_view()));
    ctx.bus
        .emit(Event::CurrentQuestionChanged(ctx.state.current_view()));
}

/// Interview policy: auto-answer on finalize, one answer per turn.
pub struct InterviewStrategy;

impl ModeStrategy for InterviewStrategy {
    fn kind(&self) -> ModeKind {
        ModeKind::Interview
    }

    fn should_finalize_on_silence(&self, _signal: &FinalizeSignal<'_>) -> bool {
        true
    }

    fn on_question_finalized(
        &self,
        ctx: &mut ModeContext<'_>,
        data: &QuestionFinalized,
    ) -> anyhow::Result<()> {
        emit_question_views(ctx);

        // One answer per turn: skip the auto-ask when this turn already has
        // a request in flight or an answer recorded.
        let turn = ctx.state.interview_turn_id;
        let already_requested = ctx.state.llm_requested_turn == Some(turn);
        let already_answered = ctx.state.llm_answered_turn == Some(turn);
        if already_requested || already_answered {
            debug!(turn, "skipping auto-answer, turn already served");
            return Ok(());
        }

        ctx.bus.emit(Event::ModeStartedResponding {
            question_id: data.question_id.clone(),
        });
        ctx.actions.push(ModeAction::AskLlm(data.question_id.clone()));
        Ok(())
    }

    fn on_answer_stream_end(
        &self,
        ctx: &mut ModeContext<'_>,
        _data: &AnswerStreamEnd,
    ) -> anyhow::Result<()> {
        ctx.state.llm_answered_turn = Some(ctx.state.interview_turn_id);
        Ok(())
    }

    fn on_question_click(
        &self,
        _ctx: &mut ModeContext<'_>,
        data: &QuestionClick,
    ) -> anyhow::Result<()> {
        debug!(question_id = %data.question_id, "interview mode: question clicked");
        Ok(())
    }

    fn can_re_ask(&self, _ctx: &ModeContext<'_>, _question_id: &QuestionId) -> bool {
        false
    }
}

/// Standard policy: finalize on silence, answer only on user action.
pub struct StandardStrategy;

impl ModeStrategy for StandardStrategy {
    fn kind(&self) -> ModeKind {
        ModeKind::Standard
    }

    fn should_finalize_on_silence(&self, _signal: &FinalizeSignal<'_>) -> bool {
        true
    }

    fn on_question_finalized(
        &self,
        ctx: &mut ModeContext<'_>,
        _data: &QuestionFinalized,
    ) -> anyhow::Result<()> {
        emit_question_views(ctx);
        debug!("standard mode: question promoted, awaiting user action");
        Ok(())
    }

    fn on_question_click(
        &self,
        _ctx: &mut ModeContext<'_>,
        data: &QuestionClick,
    ) -> anyhow::Result<()> {
        debug!(question_id = %data.question_id, "standard mode: question clicked");
        Ok(())
    }
}
