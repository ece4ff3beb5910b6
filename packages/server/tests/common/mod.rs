//! Shared harness for integration tests.
//!
//! Everything runs in memory: the pipeline store, the job queue, and the
//! classifier are all swapped for their test doubles behind the same
//! trait seams production uses. The lazy pool never actually connects.

use std::sync::Arc;

use classifier::testing::MockClassifier;
use sqlx::PgPool;

use server_core::common::auth::StaticTokenVerifier;
use server_core::domains::intake::filter::IntakeFilter;
use server_core::kernel::deps::ServerDeps;
use server_core::kernel::jobs::{JobQueue, MemoryJobQueue, SharedJobRegistry};
use server_core::kernel::store::MemoryPipelineStore;
use server_core::server::build_job_registry;

pub const MODERATOR_TOKEN: &str = "test-moderator-token";

pub struct Harness {
    pub store: Arc<MemoryPipelineStore>,
    pub queue: Arc<MemoryJobQueue>,
    pub classifier: Arc<MockClassifier>,
    pub deps: Arc<ServerDeps>,
    pub filter: IntakeFilter,
    pub registry: SharedJobRegistry,
}

pub fn harness() -> Harness {
    harness_with(MockClassifier::new())
}

pub fn harness_with(classifier: MockClassifier) -> Harness {
    let store = Arc::new(MemoryPipelineStore::new());
    let queue = Arc::new(MemoryJobQueue::new());
    let classifier = Arc::new(classifier);

    let pool = PgPool::connect_lazy("postgres://localhost/ignored").unwrap();
    let deps = Arc::new(ServerDeps::new(
        pool,
        store.clone(),
        queue.clone(),
        classifier.clone(),
        Arc::new(StaticTokenVerifier::new(MODERATOR_TOKEN)),
    ));

    let filter = IntakeFilter::new(store.clone(), queue.clone(), 24, 30);

    Harness {
        store,
        queue,
        classifier,
        deps,
        filter,
        registry: build_job_registry(),
    }
}

impl Harness {
    /// Run queued jobs to completion, advancing the queue clock so
    /// scheduled retries become claimable, until the queue settles.
    pub async fn drain_queue(&self) {
        loop {
            let claimed = self.queue.claim(50, "test-worker").await.unwrap();
            if claimed.is_empty() {
                // Nothing ready now; jump past any pending backoff.
                self.queue.advance_secs(7200);
                let retry = self.queue.claim(50, "test-worker").await.unwrap();
                if retry.is_empty() {
                    return;
                }
                self.execute_batch(retry).await;
                continue;
            }
            self.execute_batch(claimed).await;
        }
    }

    async fn execute_batch(&self, batch: Vec<server_core::kernel::jobs::ClaimedJob>) {
        for job in batch {
            match self.registry.execute(&job, self.deps.clone()).await {
                Ok(()) => self.queue.mark_succeeded(job.id).await.unwrap(),
                Err(e) => self
                    .queue
                    .mark_failed(
                        job.id,
                        &e.to_string(),
                        server_core::kernel::jobs::ErrorKind::Retryable,
                    )
                    .await
                    .unwrap(),
            }
        }
    }
}

/// A group-chat webhook envelope with the given message id and body text.
pub fn chat_envelope(
    message_id: &str,
    chat_id: &str,
    body: &str,
    sent_secs_ago: i64,
) -> server_core::domains::intake::envelope::WebhookEnvelope {
    let timestamp = chrono::Utc::now().timestamp() - sent_secs_ago;
    serde_json::from_value(serde_json::json!({
        "event": "message",
        "data": {
            "id": message_id,
            "chatId": chat_id,
            "timestamp": timestamp,
            "from": "9665xxxxxxx@c.us",
            "text": { "body": body },
        }
    }))
    .unwrap()
}
