//! Intake surfaces: the chat webhook and the scrape endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::bearer_token;
use crate::common::auth::verify_webhook_signature;
use crate::domains::intake::envelope::WebhookEnvelope;
use crate::domains::intake::filter::IntakeDecision;
use crate::server::app::AppState;

const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Chat webhook. Always acknowledges deliveries it could parse; a skip
/// is reported, not an error, so the platform does not redeliver.
pub async fn whatsapp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_webhook_signature(secret, &body, signature) {
            tracing::warn!("webhook delivery rejected: bad signature");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "invalid signature" })),
            )
                .into_response();
        }
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "webhook delivery rejected: unparseable body");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "invalid payload" })),
            )
                .into_response();
        }
    };

    match state.filter.ingest_chat(&envelope).await {
        Ok(IntakeDecision::Queued { job_id }) => Json(serde_json::json!({
            "received": true,
            "queued": true,
            "jobId": job_id,
        }))
        .into_response(),
        Ok(IntakeDecision::Skipped(reason)) => {
            tracing::debug!(
                message_id = %envelope.data.id,
                reason = reason.as_str(),
                "webhook delivery skipped"
            );
            Json(serde_json::json!({
                "received": true,
                "skipped": reason.as_str(),
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, message_id = %envelope.data.id, "intake failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "intake failed" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeIntake {
    pub source_id: Uuid,
    pub page_url: String,
    pub content: String,
}

/// Scraper push endpoint, operator-authenticated.
pub async fn scrape_intake(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ScrapeIntake>,
) -> Response {
    let authorized = match bearer_token(&headers) {
        Some(token) => state.deps.moderators.verify(token).await,
        None => false,
    };
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    match state
        .filter
        .ingest_scrape(input.source_id, &input.page_url, &input.content)
        .await
    {
        Ok(IntakeDecision::Queued { job_id }) => Json(serde_json::json!({
            "received": true,
            "queued": true,
            "jobId": job_id,
        }))
        .into_response(),
        Ok(IntakeDecision::Skipped(reason)) => Json(serde_json::json!({
            "received": true,
            "skipped": reason.as_str(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, page_url = %input.page_url, "scrape intake failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "intake failed" })),
            )
                .into_response()
        }
    }
}
