use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Idempotency ledger row: one per externally-identified message.
///
/// Written *before* any downstream side effect that is not itself
/// idempotent, so a webhook redelivery is a guaranteed no-op.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessedMessage {
    pub id: Uuid,
    pub external_message_id: String,
    pub source_id: Uuid,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedMessage {
    pub fn new(external_message_id: impl Into<String>, source_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_message_id: external_message_id.into(),
            source_id,
            processed_at: Utc::now(),
        }
    }
}
