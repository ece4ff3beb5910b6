//! Queue seam over the `jobs` table.
//!
//! `JobQueue` is object-safe so runners and handlers can hold
//! `Arc<dyn JobQueue>`; the generic serialization lives in the free
//! `enqueue_command` helper instead.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::job::{ErrorKind, Job, JobStatus};

/// Metadata a serializable command carries about its queue.
pub trait CommandMeta {
    /// The queue this command belongs to (the `job_type` column).
    fn command_type() -> &'static str;

    /// Enqueue-level idempotency: two commands with the same key only
    /// produce one pending job.
    fn idempotency_key(&self) -> Option<String> {
        None
    }

    fn max_retries() -> i32 {
        3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    Created(Uuid),
    /// An idempotency key matched a pending or running job.
    Duplicate(Uuid),
}

impl EnqueueResult {
    pub fn job_id(&self) -> Uuid {
        match self {
            EnqueueResult::Created(id) | EnqueueResult::Duplicate(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, EnqueueResult::Created(_))
    }
}

/// A job handed to a worker, lease held.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub id: Uuid,
    pub job: Job,
}

impl ClaimedJob {
    pub fn deserialize<C: DeserializeOwned>(&self) -> Result<C> {
        let args = self
            .job
            .args
            .clone()
            .ok_or_else(|| anyhow::anyhow!("job {} has no args", self.id))?;
        Ok(serde_json::from_value(args)?)
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue_raw(
        &self,
        job_type: &str,
        args: serde_json::Value,
        idempotency_key: Option<String>,
        max_retries: i32,
    ) -> Result<EnqueueResult>;

    async fn claim(&self, limit: i64, worker_id: &str) -> Result<Vec<ClaimedJob>>;

    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()>;

    /// Record a failure. Retryable errors with budget remaining schedule
    /// a backoff retry; everything else dead-letters the job with its
    /// payload intact.
    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()>;

    async fn dead_letters(&self, limit: i64) -> Result<Vec<Job>>;

    /// Re-enqueue a dead-lettered job as a fresh attempt and mark the
    /// dead row resolved. Returns the new job's id, or `None` if the
    /// job is not an unresolved dead letter.
    async fn replay_dead_letter(&self, job_id: Uuid) -> Result<Option<Uuid>>;
}

/// Serialize a command and enqueue it on its declared queue.
pub async fn enqueue_command<C>(queue: &dyn JobQueue, command: &C) -> Result<EnqueueResult>
where
    C: CommandMeta + Serialize + Sync,
{
    let args = serde_json::to_value(command)?;
    queue
        .enqueue_raw(
            C::command_type(),
            args,
            command.idempotency_key(),
            C::max_retries(),
        )
        .await
}

pub struct PostgresJobQueue {
    pool: PgPool,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PostgresJobQueue {
    async fn enqueue_raw(
        &self,
        job_type: &str,
        args: serde_json::Value,
        idempotency_key: Option<String>,
        max_retries: i32,
    ) -> Result<EnqueueResult> {
        if let Some(key) = &idempotency_key {
            let existing = sqlx::query_scalar::<_, Uuid>(
                r#"
                SELECT id FROM jobs
                WHERE idempotency_key = $1 AND status IN ('pending', 'running')
                LIMIT 1
                "#,
            )
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(id) = existing {
                return Ok(EnqueueResult::Duplicate(id));
            }
        }

        let job = Job::for_command(job_type, args, idempotency_key, max_retries)
            .insert(&self.pool)
            .await?;

        Ok(EnqueueResult::Created(job.id))
    }

    async fn claim(&self, limit: i64, worker_id: &str) -> Result<Vec<ClaimedJob>> {
        let jobs = Job::claim_jobs(limit, worker_id, 60_000, &self.pool).await?;
        Ok(jobs
            .into_iter()
            .map(|job| ClaimedJob { id: job.id, job })
            .collect())
    }

    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'succeeded', lease_expires_at = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()> {
        let job = Job::find_by_id(job_id, &self.pool).await?;

        if kind.should_retry() && job.retry_count < job.max_retries {
            let delay = Job::backoff_delay_secs(job.retry_count);
            let retry = job.create_retry(Utc::now() + Duration::seconds(delay));

            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'failed', error_message = $2, error_kind = $3,
                    lease_expires_at = NULL, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(job_id)
            .bind(error)
            .bind(kind)
            .execute(&self.pool)
            .await?;

            retry.insert(&self.pool).await?;

            tracing::info!(
                job_id = %job_id,
                retry_id = %retry.id,
                attempt = retry.attempt,
                delay_secs = delay,
                "job failed, retry scheduled"
            );
        } else {
            let reason = if kind.should_retry() {
                format!("retries exhausted after {} attempts: {}", job.attempt, error)
            } else {
                format!("non-retryable: {error}")
            };

            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'dead_letter', error_message = $2, error_kind = $3,
                    dead_lettered_at = NOW(), dead_letter_reason = $4,
                    lease_expires_at = NULL, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(job_id)
            .bind(error)
            .bind(kind)
            .bind(&reason)
            .execute(&self.pool)
            .await?;

            tracing::warn!(job_id = %job_id, job_type = %job.job_type, reason, "job dead-lettered");
        }

        Ok(())
    }

    async fn dead_letters(&self, limit: i64) -> Result<Vec<Job>> {
        Job::find_dead_letters(limit, &self.pool).await
    }

    async fn replay_dead_letter(&self, job_id: Uuid) -> Result<Option<Uuid>> {
        let job = match sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
        {
            Some(job) if job.status == JobStatus::DeadLetter && job.resolved_at.is_none() => job,
            _ => return Ok(None),
        };

        let replay = job.create_replay().insert(&self.pool).await?;

        sqlx::query(
            r#"
            UPDATE jobs
            SET replay_count = replay_count + 1, resolved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        tracing::info!(job_id = %job_id, replay_id = %replay.id, "dead letter replayed");

        Ok(Some(replay.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_result_accessors() {
        let id = Uuid::new_v4();
        assert!(EnqueueResult::Created(id).is_created());
        assert!(!EnqueueResult::Duplicate(id).is_created());
        assert_eq!(EnqueueResult::Duplicate(id).job_id(), id);
    }

    #[test]
    fn claimed_job_deserializes_args() {
        #[derive(serde::Deserialize)]
        struct Payload {
            text: String,
        }

        let job = Job::for_command(
            "classify_extract",
            serde_json::json!({"text": "an audition notice"}),
            None,
            3,
        );
        let claimed = ClaimedJob {
            id: job.id,
            job,
        };

        let payload: Payload = claimed.deserialize().unwrap();
        assert_eq!(payload.text, "an audition notice");
    }

    #[test]
    fn claimed_job_without_args_errors() {
        let job = Job::builder().job_type("classify_extract").build();
        let claimed = ClaimedJob { id: job.id, job };
        assert!(claimed.deserialize::<serde_json::Value>().is_err());
    }
}
