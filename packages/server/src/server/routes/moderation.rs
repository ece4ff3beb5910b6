//! Moderator actions on pending casting calls.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use super::bearer_token;
use crate::domains::listings::moderation::{moderate, ModerationAction, ModerationResult};
use crate::server::app::AppState;

async fn authorize(state: &AppState, headers: &HeaderMap) -> bool {
    match bearer_token(headers) {
        Some(token) => state.deps.moderators.verify(token).await,
        None => false,
    }
}

async fn act(state: AppState, headers: HeaderMap, id: Uuid, action: ModerationAction) -> Response {
    if !authorize(&state, &headers).await {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    match moderate(id, action, state.deps.store.as_ref()).await {
        Ok(ModerationResult::Applied) => Json(serde_json::json!({
            "id": id,
            "status": action.target().to_string(),
        }))
        .into_response(),
        Ok(ModerationResult::NoOp) => Json(serde_json::json!({
            "id": id,
            "status": action.target().to_string(),
            "alreadyApplied": true,
        }))
        .into_response(),
        Ok(ModerationResult::Conflict) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": format!("cannot {} a record in a terminal state", action.as_str()),
            })),
        )
            .into_response(),
        Ok(ModerationResult::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "casting call not found" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, call_id = %id, "moderation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "moderation failed" })),
            )
                .into_response()
        }
    }
}

pub async fn approve_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    act(state, headers, id, ModerationAction::Approve).await
}

pub async fn reject_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    act(state, headers, id, ModerationAction::Reject).await
}
