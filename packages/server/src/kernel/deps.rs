//! ServerDeps - using traits for testability.

use std::sync::Arc;

use classifier::TextClassifier;
use sqlx::PgPool;

use crate::common::auth::ModeratorVerifier;
use crate::kernel::jobs::JobQueue;
use crate::kernel::store::PipelineStore;

/// Shared dependencies handed to route handlers and job handlers.
/// Trait objects at the seams let tests substitute in-memory fakes.
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub store: Arc<dyn PipelineStore>,
    pub queue: Arc<dyn JobQueue>,
    pub classifier: Arc<dyn TextClassifier>,
    pub moderators: Arc<dyn ModeratorVerifier>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        store: Arc<dyn PipelineStore>,
        queue: Arc<dyn JobQueue>,
        classifier: Arc<dyn TextClassifier>,
        moderators: Arc<dyn ModeratorVerifier>,
    ) -> Self {
        Self {
            db_pool,
            store,
            queue,
            classifier,
            moderators,
        }
    }
}
