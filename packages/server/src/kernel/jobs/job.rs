//! Job model for background pipeline work.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    DeadLetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "error_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient fault - will retry if attempts remain
    #[default]
    Retryable,
    /// Permanent error - will not retry
    NonRetryable,
}

impl ErrorKind {
    pub fn should_retry(&self) -> bool {
        matches!(self, ErrorKind::Retryable)
    }
}

const ALL_COLUMNS: &str = r#"
    id, job_type, args, status, max_retries, retry_count, attempt,
    next_run_at, lease_duration_ms, lease_expires_at, worker_id,
    error_message, error_kind, dead_lettered_at, dead_letter_reason,
    replay_count, resolved_at, root_job_id, idempotency_key, created_at, updated_at
"#;

/// One unit of queued work. The queue a job belongs to is its `job_type`.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,
    pub job_type: String,

    /// Full original payload; preserved verbatim into the dead letter.
    #[builder(default, setter(strip_option))]
    pub args: Option<serde_json::Value>,

    #[builder(default)]
    pub status: JobStatus,

    // Retry budget
    #[builder(default = 3)]
    pub max_retries: i32,
    #[builder(default = 0)]
    pub retry_count: i32,
    #[builder(default = 1)]
    pub attempt: i32,

    // Scheduling (retries are future-dated)
    #[builder(default, setter(strip_option))]
    pub next_run_at: Option<DateTime<Utc>>,

    // Lease management
    #[builder(default = 60_000)]
    pub lease_duration_ms: i64,
    #[builder(default, setter(strip_option))]
    pub lease_expires_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub worker_id: Option<String>,

    // Error tracking
    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,
    #[builder(default, setter(strip_option))]
    pub error_kind: Option<ErrorKind>,

    // Dead letter workflow
    #[builder(default, setter(strip_option))]
    pub dead_lettered_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub dead_letter_reason: Option<String>,
    #[builder(default = 0)]
    pub replay_count: i32,
    /// Set once a replay has been enqueued; resolved rows leave the
    /// dead-letter listing and the health count.
    #[builder(default, setter(strip_option))]
    pub resolved_at: Option<DateTime<Utc>>,

    // Retry/replay chain tracing
    #[builder(default, setter(strip_option))]
    pub root_job_id: Option<Uuid>,

    // Enqueue-level idempotency
    #[builder(default, setter(strip_option))]
    pub idempotency_key: Option<String>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a job for a serialized command.
    pub fn for_command(
        job_type: &str,
        args: serde_json::Value,
        idempotency_key: Option<String>,
        max_retries: i32,
    ) -> Self {
        Self::builder()
            .job_type(job_type.to_string())
            .args(args)
            .max_retries(max_retries)
            .idempotency_key(idempotency_key.unwrap_or_default())
            .build()
            .normalize_idempotency_key()
    }

    // TypedBuilder's strip_option makes the key setter take a String, so
    // an empty key stands in for "no key" during construction.
    fn normalize_idempotency_key(mut self) -> Self {
        if self.idempotency_key.as_deref() == Some("") {
            self.idempotency_key = None;
        }
        self
    }

    /// Exponential backoff delay in seconds for the next retry.
    pub fn backoff_delay_secs(retry_count: i32) -> i64 {
        2i64.pow(retry_count.clamp(0, 30) as u32).min(3600)
    }

    /// Check if the job is ready to run.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        match self.next_run_at {
            None => true,
            Some(next_run) => next_run <= now,
        }
    }

    /// Create a retry job from a failed job, scheduled for the future.
    pub fn create_retry(&self, scheduled_for: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: self.job_type.clone(),
            args: self.args.clone(),
            status: JobStatus::Pending,
            max_retries: self.max_retries,
            retry_count: self.retry_count + 1,
            attempt: self.attempt + 1,
            next_run_at: Some(scheduled_for),
            lease_duration_ms: self.lease_duration_ms,
            lease_expires_at: None,
            worker_id: None,
            error_message: None,
            error_kind: None,
            dead_lettered_at: None,
            dead_letter_reason: None,
            replay_count: 0,
            resolved_at: None,
            root_job_id: self.root_job_id.or(Some(self.id)),
            idempotency_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Create a fresh attempt from a dead-lettered job, payload intact.
    pub fn create_replay(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: self.job_type.clone(),
            args: self.args.clone(),
            status: JobStatus::Pending,
            max_retries: self.max_retries,
            retry_count: 0,
            attempt: 1,
            next_run_at: None,
            lease_duration_ms: self.lease_duration_ms,
            lease_expires_at: None,
            worker_id: None,
            error_message: None,
            error_kind: None,
            dead_lettered_at: None,
            dead_letter_reason: None,
            replay_count: 0,
            resolved_at: None,
            root_job_id: self.root_job_id.or(Some(self.id)),
            idempotency_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let job = sqlx::query_as::<_, Self>(&format!(
            "SELECT {ALL_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let job = sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO jobs (
                id, job_type, args, status, max_retries, retry_count, attempt,
                next_run_at, lease_duration_ms, lease_expires_at, worker_id,
                error_message, error_kind, dead_lettered_at, dead_letter_reason,
                replay_count, resolved_at, root_job_id, idempotency_key, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10, $11,
                $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21
            )
            RETURNING {ALL_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.job_type)
        .bind(&self.args)
        .bind(self.status)
        .bind(self.max_retries)
        .bind(self.retry_count)
        .bind(self.attempt)
        .bind(self.next_run_at)
        .bind(self.lease_duration_ms)
        .bind(self.lease_expires_at)
        .bind(&self.worker_id)
        .bind(&self.error_message)
        .bind(self.error_kind)
        .bind(self.dead_lettered_at)
        .bind(&self.dead_letter_reason)
        .bind(self.replay_count)
        .bind(self.resolved_at)
        .bind(self.root_job_id)
        .bind(&self.idempotency_key)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    /// Claim jobs atomically using FOR UPDATE SKIP LOCKED.
    /// Also recovers stale jobs with expired leases.
    pub async fn claim_jobs(
        limit: i64,
        worker_id: &str,
        lease_duration_ms: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Self>(&format!(
            r#"
            WITH next_jobs AS (
                SELECT id
                FROM jobs
                WHERE
                    (status = 'pending' AND (next_run_at IS NULL OR next_run_at <= NOW()))
                    OR (status = 'running' AND lease_expires_at < NOW())
                ORDER BY COALESCE(next_run_at, created_at)
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET
                status = 'running',
                lease_expires_at = NOW() + ($2 || ' milliseconds')::INTERVAL,
                worker_id = $3,
                updated_at = NOW()
            WHERE id IN (SELECT id FROM next_jobs)
            RETURNING {ALL_COLUMNS}
            "#
        ))
        .bind(limit)
        .bind(lease_duration_ms.to_string())
        .bind(worker_id)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    pub async fn find_dead_letters(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {ALL_COLUMNS}
            FROM jobs
            WHERE status = 'dead_letter' AND resolved_at IS NULL
            ORDER BY dead_lettered_at DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }
}
