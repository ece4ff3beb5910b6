use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Moderation status of a casting call.
///
/// `pending_review` is entered only at creation; `live` and `rejected`
/// are terminal and never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "casting_call_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CastingCallStatus {
    PendingReview,
    Live,
    Rejected,
}

impl CastingCallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CastingCallStatus::Live | CastingCallStatus::Rejected)
    }
}

impl std::fmt::Display for CastingCallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastingCallStatus::PendingReview => write!(f, "pending_review"),
            CastingCallStatus::Live => write!(f, "live"),
            CastingCallStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// CandidateRecord - a pipeline-produced draft casting-opportunity entry.
///
/// `content_hash` is the row's permanent identity key; it is computed once
/// at creation and never re-hashed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CastingCall {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub compensation: Option<String>,
    pub requirements: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub contact_info: Option<String>,
    pub source_url: Option<String>,
    pub content_hash: String,
    pub status: CastingCallStatus,
    /// True for anything produced by this pipeline.
    pub is_aggregated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload for the dedup guard. Always enters moderation as
/// `pending_review` with `is_aggregated = true`.
#[derive(Debug, Clone)]
pub struct NewCastingCall {
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub compensation: Option<String>,
    pub requirements: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub contact_info: Option<String>,
    pub source_url: Option<String>,
    pub content_hash: String,
}

impl NewCastingCall {
    /// Materialize into a full record (used by the in-memory store; the
    /// Postgres store lets the database fill defaults).
    pub fn into_call(self) -> CastingCall {
        let now = Utc::now();
        CastingCall {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            company: self.company,
            location: self.location,
            compensation: self.compensation,
            requirements: self.requirements,
            deadline: self.deadline,
            contact_info: self.contact_info,
            source_url: self.source_url,
            content_hash: self.content_hash,
            status: CastingCallStatus::PendingReview,
            is_aggregated: true,
            created_at: now,
            updated_at: now,
        }
    }
}
