//! Classification & extraction worker.
//!
//! The handler separates content outcomes from faults. "Not a casting
//! call" and "classifier said yes but extraction produced nothing" are
//! terminal, successful outcomes - the job completes and is never
//! retried. Transport errors, timeouts, and rate limits from the
//! classifier propagate as errors so the queue retries them.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domains::listings::jobs::CreateRecordCommand;
use crate::kernel::deps::ServerDeps;
use crate::kernel::jobs::{enqueue_command, CommandMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyExtractCommand {
    pub text: String,
    pub source_id: Uuid,
    pub source_url: String,
    pub external_message_id: String,
}

impl CommandMeta for ClassifyExtractCommand {
    fn command_type() -> &'static str {
        "classify_extract"
    }

    fn idempotency_key(&self) -> Option<String> {
        Some(format!("classify:{}", self.external_message_id))
    }
}

pub async fn handle_classify_extract(
    command: ClassifyExtractCommand,
    deps: Arc<ServerDeps>,
) -> Result<()> {
    // Both classifier calls return Err on transient faults, which the
    // runner turns into retries. Content verdicts come back as Ok.
    let is_casting_call = deps.classifier.classify(&command.text).await?;

    if !is_casting_call {
        tracing::info!(
            source_id = %command.source_id,
            message_id = %command.external_message_id,
            outcome = "not_casting_call",
            "message classified as not a casting call"
        );
        return Ok(());
    }

    let fields = match deps.classifier.extract(&command.text).await? {
        Some(fields) => fields,
        None => {
            tracing::warn!(
                source_id = %command.source_id,
                message_id = %command.external_message_id,
                outcome = "extraction_failed",
                "classifier affirmed but extraction produced no usable fields"
            );
            return Ok(());
        }
    };

    let next = CreateRecordCommand {
        fields,
        source_id: command.source_id,
        source_url: command.source_url,
        external_message_id: command.external_message_id,
    };
    let result = enqueue_command(deps.queue.as_ref(), &next).await?;

    tracing::info!(
        source_id = %next.source_id,
        message_id = %next.external_message_id,
        job_id = %result.job_id(),
        "extraction complete, record creation queued"
    );

    Ok(())
}
