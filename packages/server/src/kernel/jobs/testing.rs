//! In-memory job queue for tests.
//!
//! Keeps the retry, dead-letter, and replay behavior of the Postgres
//! queue, with a controllable clock so backoff schedules can be
//! crossed without sleeping.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::job::{ErrorKind, Job, JobStatus};
use super::queue::{ClaimedJob, EnqueueResult, JobQueue};

#[derive(Default)]
struct Inner {
    jobs: Vec<Job>,
    clock_skew_secs: i64,
}

#[derive(Default)]
pub struct MemoryJobQueue {
    inner: Mutex<Inner>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn now(inner: &Inner) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(inner.clock_skew_secs)
    }

    /// Move the queue's clock forward so scheduled retries become ready.
    pub fn advance_secs(&self, secs: i64) {
        self.inner.lock().unwrap().clock_skew_secs += secs;
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.inner.lock().unwrap().jobs.clone()
    }

    pub fn jobs_of_type(&self, job_type: &str) -> Vec<Job> {
        self.jobs()
            .into_iter()
            .filter(|j| j.job_type == job_type)
            .collect()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue_raw(
        &self,
        job_type: &str,
        args: serde_json::Value,
        idempotency_key: Option<String>,
        max_retries: i32,
    ) -> Result<EnqueueResult> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(key) = &idempotency_key {
            if let Some(existing) = inner.jobs.iter().find(|j| {
                j.idempotency_key.as_deref() == Some(key.as_str())
                    && matches!(j.status, JobStatus::Pending | JobStatus::Running)
            }) {
                return Ok(EnqueueResult::Duplicate(existing.id));
            }
        }

        let job = Job::for_command(job_type, args, idempotency_key, max_retries);
        let id = job.id;
        inner.jobs.push(job);
        Ok(EnqueueResult::Created(id))
    }

    async fn claim(&self, limit: i64, worker_id: &str) -> Result<Vec<ClaimedJob>> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::now(&inner);

        let mut claimed = Vec::new();
        for job in inner.jobs.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            let ready = job.is_ready(now)
                || (job.status == JobStatus::Running
                    && job.lease_expires_at.is_some_and(|lease| lease < now));
            if ready {
                job.status = JobStatus::Running;
                job.lease_expires_at = Some(now + Duration::milliseconds(job.lease_duration_ms));
                job.worker_id = Some(worker_id.to_string());
                job.updated_at = now;
                claimed.push(ClaimedJob {
                    id: job.id,
                    job: job.clone(),
                });
            }
        }

        Ok(claimed)
    }

    async fn mark_succeeded(&self, job_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            job.status = JobStatus::Succeeded;
            job.lease_expires_at = None;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str, kind: ErrorKind) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let now = Self::now(&inner);

        let job = inner
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("job {job_id} not found"))?;

        if kind.should_retry() && job.retry_count < job.max_retries {
            let delay = Job::backoff_delay_secs(job.retry_count);
            let retry = job.create_retry(now + Duration::seconds(delay));

            let failed = inner.jobs.iter_mut().find(|j| j.id == job_id).unwrap();
            failed.status = JobStatus::Failed;
            failed.error_message = Some(error.to_string());
            failed.error_kind = Some(kind);
            failed.lease_expires_at = None;
            failed.updated_at = now;

            inner.jobs.push(retry);
        } else {
            let reason = if kind.should_retry() {
                format!("retries exhausted after {} attempts: {}", job.attempt, error)
            } else {
                format!("non-retryable: {error}")
            };

            let failed = inner.jobs.iter_mut().find(|j| j.id == job_id).unwrap();
            failed.status = JobStatus::DeadLetter;
            failed.error_message = Some(error.to_string());
            failed.error_kind = Some(kind);
            failed.dead_lettered_at = Some(now);
            failed.dead_letter_reason = Some(reason);
            failed.lease_expires_at = None;
            failed.updated_at = now;
        }

        Ok(())
    }

    async fn dead_letters(&self, limit: i64) -> Result<Vec<Job>> {
        let mut dead: Vec<Job> = self
            .jobs()
            .into_iter()
            .filter(|j| j.status == JobStatus::DeadLetter && j.resolved_at.is_none())
            .collect();
        dead.sort_by(|a, b| b.dead_lettered_at.cmp(&a.dead_lettered_at));
        dead.truncate(limit as usize);
        Ok(dead)
    }

    async fn replay_dead_letter(&self, job_id: Uuid) -> Result<Option<Uuid>> {
        let mut inner = self.inner.lock().unwrap();

        let replay = match inner.jobs.iter().find(|j| j.id == job_id) {
            Some(job) if job.status == JobStatus::DeadLetter && job.resolved_at.is_none() => {
                job.create_replay()
            }
            _ => return Ok(None),
        };

        let replay_id = replay.id;
        if let Some(original) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            original.replay_count += 1;
            original.resolved_at = Some(Utc::now());
            original.updated_at = Utc::now();
        }
        inner.jobs.push(replay);

        Ok(Some(replay_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::jobs::queue::{enqueue_command, CommandMeta};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct TestCommand {
        text: String,
    }

    impl CommandMeta for TestCommand {
        fn command_type() -> &'static str {
            "test_command"
        }

        fn idempotency_key(&self) -> Option<String> {
            Some(format!("test:{}", self.text))
        }
    }

    #[tokio::test]
    async fn idempotency_key_dedupes_pending_jobs() {
        let queue = MemoryJobQueue::new();
        let command = TestCommand {
            text: "hello".to_string(),
        };

        let first = enqueue_command(&queue, &command).await.unwrap();
        let second = enqueue_command(&queue, &command).await.unwrap();

        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(second.job_id(), first.job_id());
        assert_eq!(queue.jobs().len(), 1);
    }

    #[tokio::test]
    async fn retryable_failure_schedules_backoff_retry() {
        let queue = MemoryJobQueue::new();
        let result = queue
            .enqueue_raw("test_command", serde_json::json!({}), None, 3)
            .await
            .unwrap();

        let claimed = queue.claim(10, "w1").await.unwrap();
        assert_eq!(claimed.len(), 1);

        queue
            .mark_failed(result.job_id(), "boom", ErrorKind::Retryable)
            .await
            .unwrap();

        // Retry is future-dated, not immediately claimable.
        assert!(queue.claim(10, "w1").await.unwrap().is_empty());

        queue.advance_secs(2);
        let claimed = queue.claim(10, "w1").await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].job.retry_count, 1);
        assert_eq!(claimed[0].job.attempt, 2);
    }

    #[tokio::test]
    async fn non_retryable_failure_dead_letters_immediately() {
        let queue = MemoryJobQueue::new();
        let result = queue
            .enqueue_raw("test_command", serde_json::json!({"k": "v"}), None, 3)
            .await
            .unwrap();

        queue.claim(10, "w1").await.unwrap();
        queue
            .mark_failed(result.job_id(), "bad payload", ErrorKind::NonRetryable)
            .await
            .unwrap();

        let dead = queue.dead_letters(10).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].args, Some(serde_json::json!({"k": "v"})));
        assert!(dead[0]
            .dead_letter_reason
            .as_deref()
            .unwrap()
            .starts_with("non-retryable"));
    }

    #[tokio::test]
    async fn exhausted_retries_dead_letter_with_payload() {
        let queue = MemoryJobQueue::new();
        queue
            .enqueue_raw("test_command", serde_json::json!({"text": "payload"}), None, 2)
            .await
            .unwrap();

        // Drive the chain through its full retry budget.
        for _ in 0..3 {
            queue.advance_secs(3600);
            let claimed = queue.claim(10, "w1").await.unwrap();
            assert_eq!(claimed.len(), 1);
            queue
                .mark_failed(claimed[0].id, "still broken", ErrorKind::Retryable)
                .await
                .unwrap();
        }

        let dead = queue.dead_letters(10).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].retry_count, 2);
        assert_eq!(dead[0].args, Some(serde_json::json!({"text": "payload"})));
    }

    #[tokio::test]
    async fn replay_creates_fresh_job_from_dead_letter() {
        let queue = MemoryJobQueue::new();
        let result = queue
            .enqueue_raw("test_command", serde_json::json!({"text": "x"}), None, 3)
            .await
            .unwrap();

        queue.claim(10, "w1").await.unwrap();
        queue
            .mark_failed(result.job_id(), "bad", ErrorKind::NonRetryable)
            .await
            .unwrap();

        let replay_id = queue
            .replay_dead_letter(result.job_id())
            .await
            .unwrap()
            .expect("dead letter should replay");

        let jobs = queue.jobs();
        let replay = jobs.iter().find(|j| j.id == replay_id).unwrap();
        assert_eq!(replay.status, JobStatus::Pending);
        assert_eq!(replay.retry_count, 0);
        assert_eq!(replay.args, Some(serde_json::json!({"text": "x"})));
        assert_eq!(replay.root_job_id, Some(result.job_id()));

        let original = jobs.iter().find(|j| j.id == result.job_id()).unwrap();
        assert_eq!(original.replay_count, 1);
        assert!(original.resolved_at.is_some());

        // Replaying a non-dead job is a no-op, and so is replaying the
        // already-resolved original.
        assert!(queue.replay_dead_letter(replay_id).await.unwrap().is_none());
        assert!(queue
            .replay_dead_letter(result.job_id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn replayed_dead_letters_leave_the_listing() {
        let queue = MemoryJobQueue::new();
        let result = queue
            .enqueue_raw("test_command", serde_json::json!({"text": "x"}), None, 3)
            .await
            .unwrap();

        queue.claim(10, "w1").await.unwrap();
        queue
            .mark_failed(result.job_id(), "bad", ErrorKind::NonRetryable)
            .await
            .unwrap();
        assert_eq!(queue.dead_letters(10).await.unwrap().len(), 1);

        let replay_id = queue
            .replay_dead_letter(result.job_id())
            .await
            .unwrap()
            .unwrap();
        queue.claim(10, "w1").await.unwrap();
        queue.mark_succeeded(replay_id).await.unwrap();

        // The dead row is resolved: it no longer shows up for operators
        // and stops counting against pipeline health.
        assert!(queue.dead_letters(10).await.unwrap().is_empty());
    }
}
