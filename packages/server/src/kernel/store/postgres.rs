//! PostgreSQL-backed pipeline store.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{InsertCallOutcome, PipelineStore};
use crate::domains::listings::models::{CastingCall, CastingCallStatus, NewCastingCall};
use crate::domains::source::models::IngestionSource;

pub struct PostgresPipelineStore {
    pool: PgPool,
}

impl PostgresPipelineStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStore for PostgresPipelineStore {
    async fn find_active_source_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<IngestionSource>> {
        let source = sqlx::query_as::<_, IngestionSource>(
            "SELECT * FROM sources WHERE source_identifier = $1 AND is_active = true",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(source)
    }

    async fn find_source(&self, id: Uuid) -> Result<Option<IngestionSource>> {
        let source = sqlx::query_as::<_, IngestionSource>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(source)
    }

    async fn touch_source_processed(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sources SET last_processed_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn is_message_processed(&self, external_message_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM processed_messages WHERE external_message_id = $1)",
        )
        .bind(external_message_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn record_processed_message(
        &self,
        external_message_id: &str,
        source_id: Uuid,
    ) -> Result<bool> {
        // ON CONFLICT DO NOTHING resolves a redelivery race without an
        // error: rows_affected = 0 means another delivery won.
        let result = sqlx::query(
            r#"
            INSERT INTO processed_messages (id, external_message_id, source_id, processed_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (external_message_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(external_message_id)
        .bind(source_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_call_by_content_hash(&self, content_hash: &str) -> Result<Option<CastingCall>> {
        let call = sqlx::query_as::<_, CastingCall>(
            "SELECT * FROM casting_calls WHERE content_hash = $1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(call)
    }

    async fn find_call(&self, id: Uuid) -> Result<Option<CastingCall>> {
        let call = sqlx::query_as::<_, CastingCall>("SELECT * FROM casting_calls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(call)
    }

    async fn insert_casting_call(&self, draft: NewCastingCall) -> Result<InsertCallOutcome> {
        let result = sqlx::query_as::<_, CastingCall>(
            r#"
            INSERT INTO casting_calls (
                id, title, description, company, location, compensation,
                requirements, deadline, contact_info, source_url,
                content_hash, status, is_aggregated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending_review', true)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.company)
        .bind(&draft.location)
        .bind(&draft.compensation)
        .bind(&draft.requirements)
        .bind(draft.deadline)
        .bind(&draft.contact_info)
        .bind(&draft.source_url)
        .bind(&draft.content_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(call) => Ok(InsertCallOutcome::Created(call)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Ok(InsertCallOutcome::DuplicateHash)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_call_status(
        &self,
        id: Uuid,
        from: CastingCallStatus,
        to: CastingCallStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE casting_calls
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
