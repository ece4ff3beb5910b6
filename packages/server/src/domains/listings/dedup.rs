//! Deduplication guard in front of record creation.
//!
//! Identity is the content hash over the normalized title, description,
//! company, and location. The unique constraint on `content_hash` is the
//! arbiter under concurrency; the pre-check only saves a round trip.

use anyhow::Result;
use chrono::NaiveDate;
use classifier::CastingFields;
use uuid::Uuid;

use super::models::{CastingCall, NewCastingCall};
use crate::common::utils::content_hash::casting_content_hash;
use crate::kernel::store::{InsertCallOutcome, PipelineStore};

#[derive(Debug)]
pub enum DedupOutcome {
    Created(CastingCall),
    /// An equivalent record already exists; nothing was written.
    Duplicate(Uuid),
}

/// Create a casting call from extracted fields unless an equivalent
/// record already exists.
pub async fn dedup_and_create(
    fields: &CastingFields,
    source_url: &str,
    store: &dyn PipelineStore,
) -> Result<DedupOutcome> {
    let content_hash = casting_content_hash(
        &fields.title,
        fields.description.as_deref(),
        fields.company.as_deref(),
        fields.location.as_deref(),
    );

    if let Some(existing) = store.find_call_by_content_hash(&content_hash).await? {
        return Ok(DedupOutcome::Duplicate(existing.id));
    }

    let draft = NewCastingCall {
        title: fields.title.clone(),
        description: fields.description.clone(),
        company: fields.company.clone(),
        location: fields.location.clone(),
        compensation: fields.compensation.clone(),
        requirements: fields.requirements.clone(),
        deadline: fields.deadline.as_deref().and_then(parse_deadline),
        contact_info: fields.contact_info.clone(),
        source_url: Some(source_url.to_string()),
        content_hash: content_hash.clone(),
    };

    match store.insert_casting_call(draft).await? {
        InsertCallOutcome::Created(call) => Ok(DedupOutcome::Created(call)),
        InsertCallOutcome::DuplicateHash => {
            // Lost a race; re-read for the winner's id.
            let existing = store
                .find_call_by_content_hash(&content_hash)
                .await?
                .ok_or_else(|| {
                    anyhow::anyhow!("hash conflict for {content_hash} but no row found")
                })?;
            Ok(DedupOutcome::Duplicate(existing.id))
        }
    }
}

/// Lenient deadline parsing. Extracted text is unreliable; a date that
/// fits no known format becomes no deadline rather than a failure.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_deadline("2026-09-15"),
            NaiveDate::from_ymd_opt(2026, 9, 15)
        );
    }

    #[test]
    fn parses_day_first_formats() {
        assert_eq!(
            parse_deadline("15/09/2026"),
            NaiveDate::from_ymd_opt(2026, 9, 15)
        );
        assert_eq!(
            parse_deadline("15-09-2026"),
            NaiveDate::from_ymd_opt(2026, 9, 15)
        );
    }

    #[test]
    fn unparseable_dates_become_none() {
        assert_eq!(parse_deadline("next Friday"), None);
        assert_eq!(parse_deadline("September 15th"), None);
        assert_eq!(parse_deadline(""), None);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(
            parse_deadline("  2026-01-02  "),
            NaiveDate::from_ymd_opt(2026, 1, 2)
        );
    }
}
