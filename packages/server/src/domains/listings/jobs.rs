//! Record-creation worker: the retry boundary around dedup + insert.
//!
//! Arriving at a duplicate is a successful outcome here. Only storage
//! faults propagate as errors for the queue to retry.

use std::sync::Arc;

use anyhow::Result;
use classifier::CastingFields;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dedup::{dedup_and_create, DedupOutcome};
use crate::kernel::deps::ServerDeps;
use crate::kernel::jobs::CommandMeta;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordCommand {
    pub fields: CastingFields,
    pub source_id: Uuid,
    pub source_url: String,
    pub external_message_id: String,
}

impl CommandMeta for CreateRecordCommand {
    fn command_type() -> &'static str {
        "create_record"
    }

    fn idempotency_key(&self) -> Option<String> {
        Some(format!("create:{}", self.external_message_id))
    }
}

pub async fn handle_create_record(
    command: CreateRecordCommand,
    deps: Arc<ServerDeps>,
) -> Result<()> {
    match dedup_and_create(&command.fields, &command.source_url, deps.store.as_ref()).await? {
        DedupOutcome::Created(call) => {
            tracing::info!(
                call_id = %call.id,
                source_id = %command.source_id,
                title = %call.title,
                "casting call created, pending review"
            );
        }
        DedupOutcome::Duplicate(existing_id) => {
            tracing::info!(
                existing_id = %existing_id,
                source_id = %command.source_id,
                message_id = %command.external_message_id,
                "duplicate content, record not created"
            );
        }
    }

    Ok(())
}
