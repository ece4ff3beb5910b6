//! Dead-letter inspection and replay.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::bearer_token;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> bool {
    match bearer_token(headers) {
        Some(token) => state.deps.moderators.verify(token).await,
        None => false,
    }
}

pub async fn list_dead_letters(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Response {
    if !authorize(&state, &headers).await {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    match state.deps.queue.dead_letters(params.limit.clamp(1, 500)).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "dead letter listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "listing failed" })),
            )
                .into_response()
        }
    }
}

pub async fn replay_dead_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    if !authorize(&state, &headers).await {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    match state.deps.queue.replay_dead_letter(id).await {
        Ok(Some(replay_id)) => Json(serde_json::json!({
            "replayed": id,
            "newJobId": replay_id,
        }))
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no dead-lettered job with that id" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, job_id = %id, "dead letter replay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "replay failed" })),
            )
                .into_response()
        }
    }
}
