//! In-memory pipeline store for tests.
//!
//! Mirrors the Postgres store's behavior, including the unique-constraint
//! semantics on `external_message_id` and `content_hash`, so pipeline
//! logic can be exercised without a database.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{InsertCallOutcome, PipelineStore};
use crate::domains::intake::models::ProcessedMessage;
use crate::domains::listings::models::{CastingCall, CastingCallStatus, NewCastingCall};
use crate::domains::source::models::{IngestionSource, SourceType};

#[derive(Default)]
struct Inner {
    sources: Vec<IngestionSource>,
    processed: Vec<ProcessedMessage>,
    calls: Vec<CastingCall>,
}

#[derive(Default)]
pub struct MemoryPipelineStore {
    inner: Mutex<Inner>,
}

impl MemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a source directly (tests stand in for the registry here).
    pub fn add_source(
        &self,
        source_type: SourceType,
        identifier: impl Into<String>,
        active: bool,
    ) -> IngestionSource {
        let now = Utc::now();
        let source = IngestionSource {
            id: Uuid::new_v4(),
            source_type,
            source_identifier: identifier.into(),
            source_name: "test source".to_string(),
            is_active: active,
            last_processed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().sources.push(source.clone());
        source
    }

    pub fn processed_messages(&self) -> Vec<ProcessedMessage> {
        self.inner.lock().unwrap().processed.clone()
    }

    pub fn calls(&self) -> Vec<CastingCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Seed an existing casting call (for moderation tests).
    pub fn add_call(&self, draft: NewCastingCall) -> CastingCall {
        let call = draft.into_call();
        self.inner.lock().unwrap().calls.push(call.clone());
        call
    }

    pub fn source(&self, id: Uuid) -> Option<IngestionSource> {
        self.inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }
}

#[async_trait]
impl PipelineStore for MemoryPipelineStore {
    async fn find_active_source_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<IngestionSource>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .find(|s| s.source_identifier == identifier && s.is_active)
            .cloned())
    }

    async fn find_source(&self, id: Uuid) -> Result<Option<IngestionSource>> {
        Ok(self.source(id))
    }

    async fn touch_source_processed(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == id) {
            source.last_processed_at = Some(Utc::now());
            source.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn is_message_processed(&self, external_message_id: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .processed
            .iter()
            .any(|m| m.external_message_id == external_message_id))
    }

    async fn record_processed_message(
        &self,
        external_message_id: &str,
        source_id: Uuid,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .processed
            .iter()
            .any(|m| m.external_message_id == external_message_id)
        {
            return Ok(false);
        }
        inner
            .processed
            .push(ProcessedMessage::new(external_message_id, source_id));
        Ok(true)
    }

    async fn find_call_by_content_hash(&self, content_hash: &str) -> Result<Option<CastingCall>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .find(|c| c.content_hash == content_hash)
            .cloned())
    }

    async fn find_call(&self, id: Uuid) -> Result<Option<CastingCall>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn insert_casting_call(&self, draft: NewCastingCall) -> Result<InsertCallOutcome> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .calls
            .iter()
            .any(|c| c.content_hash == draft.content_hash)
        {
            return Ok(InsertCallOutcome::DuplicateHash);
        }
        let call = draft.into_call();
        inner.calls.push(call.clone());
        Ok(InsertCallOutcome::Created(call))
    }

    async fn set_call_status(
        &self,
        id: Uuid,
        from: CastingCallStatus,
        to: CastingCallStatus,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .calls
            .iter_mut()
            .find(|c| c.id == id && c.status == from)
        {
            Some(call) => {
                call.status = to;
                call.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
