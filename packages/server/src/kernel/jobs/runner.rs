//! Polling worker loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::job::ErrorKind;
use super::queue::JobQueue;
use super::registry::SharedJobRegistry;
use crate::kernel::deps::ServerDeps;

#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    pub batch_size: i64,
    pub poll_interval: Duration,
    pub worker_id: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_interval: Duration::from_secs(2),
            worker_id: format!("runner-{}", Uuid::new_v4()),
        }
    }
}

pub struct JobRunner {
    queue: Arc<dyn JobQueue>,
    registry: SharedJobRegistry,
    deps: Arc<ServerDeps>,
    config: JobRunnerConfig,
}

impl JobRunner {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        registry: SharedJobRegistry,
        deps: Arc<ServerDeps>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            deps,
            config,
        }
    }

    /// Claim-execute-mark loop. Runs until the token is cancelled; a
    /// batch in flight finishes before shutdown completes.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            worker_id = %self.config.worker_id,
            job_types = ?self.registry.registered_types(),
            "job runner started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(worker_id = %self.config.worker_id, "job runner stopping");
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {
                    if let Err(e) = self.run_batch().await {
                        tracing::error!(error = %e, "job batch failed");
                    }
                }
            }
        }
    }

    async fn run_batch(&self) -> anyhow::Result<()> {
        let claimed = self
            .queue
            .claim(self.config.batch_size, &self.config.worker_id)
            .await?;

        for job in claimed {
            let job_id = job.id;
            let job_type = job.job.job_type.clone();

            tracing::debug!(job_id = %job_id, job_type = %job_type, attempt = job.job.attempt, "executing job");

            match self.registry.execute(&job, Arc::clone(&self.deps)).await {
                Ok(()) => {
                    self.queue.mark_succeeded(job_id).await?;
                    tracing::debug!(job_id = %job_id, "job succeeded");
                }
                Err(e) => {
                    // Handlers swallow content-level outcomes; anything
                    // that reaches here is a fault.
                    let kind = classify_fault(&e);
                    self.queue.mark_failed(job_id, &e.to_string(), kind).await?;
                    tracing::warn!(job_id = %job_id, job_type = %job_type, error = %e, "job failed");
                }
            }
        }

        Ok(())
    }
}

/// A misconfigured classifier fails the same way on every attempt, so
/// those faults skip the retry budget and dead-letter at once.
fn classify_fault(error: &anyhow::Error) -> ErrorKind {
    match error.downcast_ref::<classifier::ClassifierError>() {
        Some(e) if !e.is_transient() => ErrorKind::NonRetryable,
        _ => ErrorKind::Retryable,
    }
}
