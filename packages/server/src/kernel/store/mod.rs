//! Pipeline storage seam.
//!
//! All invariant enforcement (uniqueness of `content_hash` and
//! `external_message_id`) is pushed down to the store, because workers
//! run as independent processes with no shared memory. `PostgresPipelineStore`
//! is production; `MemoryPipelineStore` backs tests with the same
//! constraint semantics.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domains::listings::models::{CastingCall, CastingCallStatus, NewCastingCall};
use crate::domains::source::models::IngestionSource;

pub use memory::MemoryPipelineStore;
pub use postgres::PostgresPipelineStore;

/// Result of attempting to insert a casting call.
#[derive(Debug)]
pub enum InsertCallOutcome {
    Created(CastingCall),
    /// The `content_hash` unique constraint rejected the write: a
    /// concurrent or earlier job already created this record.
    DuplicateHash,
}

/// Storage operations the pipeline stages depend on.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    // -- sources ------------------------------------------------------

    async fn find_active_source_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<IngestionSource>>;

    async fn find_source(&self, id: Uuid) -> Result<Option<IngestionSource>>;

    /// Stamp the source's `last_processed_at` after a successful intake.
    async fn touch_source_processed(&self, id: Uuid) -> Result<()>;

    // -- idempotency ledger -------------------------------------------

    async fn is_message_processed(&self, external_message_id: &str) -> Result<bool>;

    /// Write the ledger row. Returns `false` when the row already existed
    /// (redelivery), in which case nothing was written.
    async fn record_processed_message(
        &self,
        external_message_id: &str,
        source_id: Uuid,
    ) -> Result<bool>;

    // -- casting calls ------------------------------------------------

    async fn find_call_by_content_hash(&self, content_hash: &str) -> Result<Option<CastingCall>>;

    async fn find_call(&self, id: Uuid) -> Result<Option<CastingCall>>;

    async fn insert_casting_call(&self, draft: NewCastingCall) -> Result<InsertCallOutcome>;

    /// Guarded status transition: only applies when the row is currently
    /// in `from`. Returns `true` when a row was updated.
    async fn set_call_status(
        &self,
        id: Uuid,
        from: CastingCallStatus,
        to: CastingCallStatus,
    ) -> Result<bool>;
}
