//! Pipeline health endpoint. 200 when within thresholds, 503 otherwise;
//! the body carries the full metric report either way.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::domains::health::monitor::{gather, verdict};
use crate::server::app::AppState;

pub async fn pipeline_health(State(state): State<AppState>) -> Response {
    let metrics = gather(&state.deps.db_pool, state.thresholds.staleness).await;
    let (healthy, problems) = verdict(&metrics, &state.thresholds, Utc::now());

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "healthy": healthy,
            "problems": problems,
            "metrics": metrics,
        })),
    )
        .into_response()
}
