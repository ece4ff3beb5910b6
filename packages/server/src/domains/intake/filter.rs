//! Intake filter: the ordered gate between raw deliveries and the
//! classification queue.
//!
//! Checks short-circuit in a fixed order so each skip is attributed to
//! exactly one reason, the first that applies. A skipped delivery is a
//! normal outcome, acknowledged to the caller, never an error.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use super::envelope::WebhookEnvelope;
use super::jobs::ClassifyExtractCommand;
use crate::kernel::jobs::{enqueue_command, JobQueue};
use crate::kernel::store::PipelineStore;

/// Why a delivery did not enter the pipeline. The wire value is
/// `as_str()`, reported back to the webhook caller and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotGroupMessage,
    NotMessageEvent,
    OldMessage,
    UnknownSource,
    AlreadyProcessed,
    InsufficientText,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotGroupMessage => "not_group_message",
            SkipReason::NotMessageEvent => "not_message_event",
            SkipReason::OldMessage => "old_message",
            SkipReason::UnknownSource => "unknown_source",
            SkipReason::AlreadyProcessed => "already_processed",
            SkipReason::InsufficientText => "insufficient_text",
        }
    }
}

#[derive(Debug)]
pub enum IntakeDecision {
    Queued { job_id: Uuid },
    Skipped(SkipReason),
}

pub struct IntakeFilter {
    store: Arc<dyn PipelineStore>,
    queue: Arc<dyn JobQueue>,
    window: Duration,
    min_content_len: usize,
}

impl IntakeFilter {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        queue: Arc<dyn JobQueue>,
        window_hours: i64,
        min_content_len: usize,
    ) -> Self {
        Self {
            store,
            queue,
            window: Duration::hours(window_hours),
            min_content_len,
        }
    }

    /// Run a chat webhook delivery through the gate.
    pub async fn ingest_chat(&self, envelope: &WebhookEnvelope) -> Result<IntakeDecision> {
        let data = &envelope.data;

        if !data.is_group_message() {
            return Ok(IntakeDecision::Skipped(SkipReason::NotGroupMessage));
        }

        if envelope.event != "message" {
            return Ok(IntakeDecision::Skipped(SkipReason::NotMessageEvent));
        }

        let sent_at = Utc
            .timestamp_opt(data.timestamp, 0)
            .single()
            .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC);
        if is_stale(sent_at, Utc::now(), self.window) {
            return Ok(IntakeDecision::Skipped(SkipReason::OldMessage));
        }

        let source = match self
            .store
            .find_active_source_by_identifier(&data.chat_id)
            .await?
        {
            Some(source) => source,
            None => return Ok(IntakeDecision::Skipped(SkipReason::UnknownSource)),
        };

        if self.store.is_message_processed(&data.id).await? {
            return Ok(IntakeDecision::Skipped(SkipReason::AlreadyProcessed));
        }

        let text = match data.extract_text() {
            Some(text) if text.chars().count() >= self.min_content_len => text.to_string(),
            _ => return Ok(IntakeDecision::Skipped(SkipReason::InsufficientText)),
        };

        // Ledger first: once the row exists, a redelivery can never
        // enqueue a second job. Losing the job after this point is the
        // acceptable failure mode, not double-processing.
        if !self
            .store
            .record_processed_message(&data.id, source.id)
            .await?
        {
            return Ok(IntakeDecision::Skipped(SkipReason::AlreadyProcessed));
        }

        self.store.touch_source_processed(source.id).await?;

        let command = ClassifyExtractCommand {
            text,
            source_id: source.id,
            source_url: data.source_url(),
            external_message_id: data.id.clone(),
        };
        let result = enqueue_command(self.queue.as_ref(), &command).await?;

        tracing::info!(
            source_id = %source.id,
            message_id = %data.id,
            job_id = %result.job_id(),
            "message queued for classification"
        );

        Ok(IntakeDecision::Queued {
            job_id: result.job_id(),
        })
    }

    /// Run scraped page content through the gate. The page URL serves as
    /// the external identifier, so a re-scrape of the same page skips.
    pub async fn ingest_scrape(
        &self,
        source_id: Uuid,
        page_url: &str,
        content: &str,
    ) -> Result<IntakeDecision> {
        let source = match self.store.find_source(source_id).await? {
            Some(source) if source.is_active => source,
            _ => return Ok(IntakeDecision::Skipped(SkipReason::UnknownSource)),
        };

        if self.store.is_message_processed(page_url).await? {
            return Ok(IntakeDecision::Skipped(SkipReason::AlreadyProcessed));
        }

        let content = content.trim();
        if content.chars().count() < self.min_content_len {
            return Ok(IntakeDecision::Skipped(SkipReason::InsufficientText));
        }

        if !self
            .store
            .record_processed_message(page_url, source.id)
            .await?
        {
            return Ok(IntakeDecision::Skipped(SkipReason::AlreadyProcessed));
        }

        self.store.touch_source_processed(source.id).await?;

        let command = ClassifyExtractCommand {
            text: content.to_string(),
            source_id: source.id,
            source_url: page_url.to_string(),
            external_message_id: page_url.to_string(),
        };
        let result = enqueue_command(self.queue.as_ref(), &command).await?;

        tracing::info!(
            source_id = %source.id,
            page_url,
            job_id = %result.job_id(),
            "scraped page queued for classification"
        );

        Ok(IntakeDecision::Queued {
            job_id: result.job_id(),
        })
    }
}

/// A message older than the window at receipt time is discarded.
fn is_stale(sent_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now - sent_at > window
}
