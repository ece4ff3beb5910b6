//! Route-level behavior: signature checks, skip acknowledgements, and
//! moderator authorization, exercised through the real router.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use common::{harness, Harness, MODERATOR_TOKEN};
use server_core::domains::health::monitor::HealthThresholds;
use server_core::domains::intake::filter::IntakeFilter;
use server_core::domains::listings::models::NewCastingCall;
use server_core::domains::source::models::SourceType;
use server_core::server::{build_app, AppState};

const GROUP: &str = "120363027@g.us";
const SECRET: &str = "webhook-secret";
const CASTING_MESSAGE: &str =
    "Looking for 3 actors for a short film, SAR 5,000, WhatsApp 05xxxxxxx";

fn app(h: &Harness) -> Router {
    let filter = IntakeFilter::new(h.store.clone(), h.queue.clone(), 24, 30);
    build_app(AppState {
        deps: h.deps.clone(),
        filter: Arc::new(filter),
        webhook_secret: Some(SECRET.to_string()),
        thresholds: HealthThresholds::default(),
    })
}

fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn webhook_body(message_id: &str, text: &str) -> String {
    serde_json::json!({
        "event": "message",
        "data": {
            "id": message_id,
            "chatId": GROUP,
            "timestamp": chrono::Utc::now().timestamp(),
            "text": { "body": text },
        }
    })
    .to_string()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn webhook_rejects_bad_signatures_before_processing() {
    let h = harness();
    h.store.add_source(SourceType::Whatsapp, GROUP, true);
    let body = webhook_body("m1", CASTING_MESSAGE);

    let response = app(&h)
        .oneshot(
            Request::post("/webhooks/whatsapp")
                .header("content-type", "application/json")
                .header("x-webhook-signature", "deadbeef")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // Nothing was touched.
    assert!(h.store.processed_messages().is_empty());
    assert!(h.queue.jobs().is_empty());
}

#[tokio::test]
async fn webhook_queues_a_signed_casting_message() {
    let h = harness();
    h.store.add_source(SourceType::Whatsapp, GROUP, true);
    let body = webhook_body("m1", CASTING_MESSAGE);
    let signature = sign(&body);

    let response = app(&h)
        .oneshot(
            Request::post("/webhooks/whatsapp")
                .header("content-type", "application/json")
                .header("x-webhook-signature", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["received"], true);
    assert_eq!(json["queued"], true);
    assert_eq!(h.queue.jobs().len(), 1);
}

#[tokio::test]
async fn webhook_acknowledges_skips_with_the_reason() {
    let h = harness();
    // No registered source for the group.
    let body = webhook_body("m1", CASTING_MESSAGE);
    let signature = sign(&body);

    let response = app(&h)
        .oneshot(
            Request::post("/webhooks/whatsapp")
                .header("content-type", "application/json")
                .header("x-webhook-signature", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    // A skip is a normal acknowledgement, never an error status.
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["received"], true);
    assert_eq!(json["skipped"], "unknown_source");
}

#[tokio::test]
async fn moderation_requires_a_valid_bearer_token() {
    let h = harness();
    let call = h.store.add_call(NewCastingCall {
        title: "Extras needed for a music video".to_string(),
        description: None,
        company: None,
        location: None,
        compensation: None,
        requirements: None,
        deadline: None,
        contact_info: None,
        source_url: None,
        content_hash: "hash-extras".to_string(),
    });

    let unauthorized = app(&h)
        .oneshot(
            Request::post(format!("/casting-calls/{}/approve", call.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

    let approved = app(&h)
        .oneshot(
            Request::post(format!("/casting-calls/{}/approve", call.id))
                .header("authorization", format!("Bearer {MODERATOR_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);

    // Crossing into the opposite terminal state is a conflict.
    let rejected = app(&h)
        .oneshot(
            Request::post(format!("/casting-calls/{}/reject", call.id))
                .header("authorization", format!("Bearer {MODERATOR_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn moderating_a_missing_call_is_not_found() {
    let h = harness();
    let response = app(&h)
        .oneshot(
            Request::post(format!("/casting-calls/{}/reject", uuid::Uuid::new_v4()))
                .header("authorization", format!("Bearer {MODERATOR_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dead_letter_routes_require_authorization() {
    let h = harness();
    let response = app(&h)
        .oneshot(
            Request::get("/dead-letters")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(&h)
        .oneshot(
            Request::get("/dead-letters")
                .header("authorization", format!("Bearer {MODERATOR_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json, serde_json::json!([]));
}
