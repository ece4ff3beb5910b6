//! Router assembly and job handler registration.

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::domains::health::monitor::HealthThresholds;
use crate::domains::intake::filter::IntakeFilter;
use crate::domains::intake::jobs::{handle_classify_extract, ClassifyExtractCommand};
use crate::domains::listings::jobs::{handle_create_record, CreateRecordCommand};
use crate::kernel::deps::ServerDeps;
use crate::kernel::jobs::{JobRegistry, SharedJobRegistry};
use crate::server::routes;

#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub filter: Arc<IntakeFilter>,
    pub webhook_secret: Option<String>,
    pub thresholds: HealthThresholds,
}

/// Wire up both pipeline stages.
pub fn build_job_registry() -> SharedJobRegistry {
    let mut registry = JobRegistry::new();
    registry.register::<ClassifyExtractCommand, _, _>(handle_classify_extract);
    registry.register::<CreateRecordCommand, _, _>(handle_create_record);
    Arc::new(registry)
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/sources", post(routes::sources::create_source))
        .route("/sources", get(routes::sources::list_sources))
        .route("/sources/:id", get(routes::sources::get_source))
        .route("/sources/:id", patch(routes::sources::update_source))
        .route(
            "/sources/:id/deactivate",
            post(routes::sources::deactivate_source),
        )
        .route("/webhooks/whatsapp", post(routes::intake::whatsapp_webhook))
        .route("/intake/scrape", post(routes::intake::scrape_intake))
        .route(
            "/casting-calls/:id/approve",
            post(routes::moderation::approve_call),
        )
        .route(
            "/casting-calls/:id/reject",
            post(routes::moderation::reject_call),
        )
        .route("/dead-letters", get(routes::dead_letter::list_dead_letters))
        .route(
            "/dead-letters/:id/replay",
            post(routes::dead_letter::replay_dead_letter),
        )
        .route("/health", get(routes::health::pipeline_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
