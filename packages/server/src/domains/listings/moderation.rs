//! Moderation state machine.
//!
//! `pending_review -> live` on approve, `pending_review -> rejected` on
//! reject. Both targets are terminal. Repeating an action that already
//! happened is an idempotent no-op; crossing terminal states (approving
//! a rejected record or vice versa) is a conflict.

use anyhow::Result;
use uuid::Uuid;

use super::models::CastingCallStatus;
use crate::kernel::store::PipelineStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn target(&self) -> CastingCallStatus {
        match self {
            ModerationAction::Approve => CastingCallStatus::Live,
            ModerationAction::Reject => CastingCallStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
        }
    }
}

/// What applying an action to a record in a given state means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply,
    AlreadyDone,
    Conflict,
}

pub fn plan_transition(current: CastingCallStatus, action: ModerationAction) -> Transition {
    let target = action.target();
    if current == CastingCallStatus::PendingReview {
        Transition::Apply
    } else if current == target {
        Transition::AlreadyDone
    } else {
        Transition::Conflict
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationResult {
    Applied,
    /// The record was already in the requested terminal state.
    NoOp,
    /// The record is in the opposite terminal state.
    Conflict,
    NotFound,
}

pub async fn moderate(
    id: Uuid,
    action: ModerationAction,
    store: &dyn PipelineStore,
) -> Result<ModerationResult> {
    let call = match store.find_call(id).await? {
        Some(call) => call,
        None => return Ok(ModerationResult::NotFound),
    };

    match plan_transition(call.status, action) {
        Transition::AlreadyDone => Ok(ModerationResult::NoOp),
        Transition::Conflict => Ok(ModerationResult::Conflict),
        Transition::Apply => {
            let updated = store
                .set_call_status(id, CastingCallStatus::PendingReview, action.target())
                .await?;

            if updated {
                tracing::info!(call_id = %id, action = action.as_str(), "moderation applied");
                return Ok(ModerationResult::Applied);
            }

            // The guarded update lost a race; re-read to classify it.
            let call = store
                .find_call(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("casting call {id} disappeared mid-moderation"))?;
            match plan_transition(call.status, action) {
                Transition::AlreadyDone => Ok(ModerationResult::NoOp),
                _ => Ok(ModerationResult::Conflict),
            }
        }
    }
}
