mod common;

use common::{chat_envelope, harness};
use server_core::domains::intake::filter::{IntakeDecision, SkipReason};
use server_core::domains::source::models::SourceType;

const GROUP: &str = "120363027@g.us";
const LONG_BODY: &str = "Looking for 3 actors for a short film, SAR 5,000, WhatsApp 05xxxxxxx";

#[tokio::test]
async fn direct_chats_are_skipped_before_anything_else() {
    let h = harness();
    // Even a registered source would not matter: the group check is first.
    let envelope = chat_envelope("m1", "9665xxxxxxx@c.us", LONG_BODY, 60);

    let decision = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::NotGroupMessage)
    ));
    assert!(h.store.processed_messages().is_empty());
    assert!(h.queue.jobs().is_empty());
}

#[tokio::test]
async fn non_message_events_are_skipped() {
    let h = harness();
    h.store.add_source(SourceType::Whatsapp, GROUP, true);

    let mut envelope = chat_envelope("m1", GROUP, LONG_BODY, 60);
    envelope.event = "message_ack".to_string();

    let decision = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::NotMessageEvent)
    ));
}

#[tokio::test]
async fn messages_older_than_the_window_are_skipped() {
    let h = harness();
    h.store.add_source(SourceType::Whatsapp, GROUP, true);

    let envelope = chat_envelope("m1", GROUP, LONG_BODY, 25 * 3600);
    let decision = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::OldMessage)
    ));

    let fresh = chat_envelope("m2", GROUP, LONG_BODY, 23 * 3600);
    let decision = h.filter.ingest_chat(&fresh).await.unwrap();
    assert!(matches!(decision, IntakeDecision::Queued { .. }));
}

#[tokio::test]
async fn unregistered_groups_are_skipped() {
    let h = harness();
    let envelope = chat_envelope("m1", GROUP, LONG_BODY, 60);

    let decision = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::UnknownSource)
    ));
}

#[tokio::test]
async fn deactivated_sources_count_as_unknown() {
    let h = harness();
    h.store.add_source(SourceType::Whatsapp, GROUP, false);

    let decision = h
        .filter
        .ingest_chat(&chat_envelope("m1", GROUP, LONG_BODY, 60))
        .await
        .unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::UnknownSource)
    ));
}

#[tokio::test]
async fn redelivery_of_a_processed_message_is_skipped() {
    let h = harness();
    h.store.add_source(SourceType::Whatsapp, GROUP, true);

    let envelope = chat_envelope("m1", GROUP, LONG_BODY, 60);
    let first = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(first, IntakeDecision::Queued { .. }));

    let second = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(
        second,
        IntakeDecision::Skipped(SkipReason::AlreadyProcessed)
    ));

    // Exactly one ledger row and one job.
    assert_eq!(h.store.processed_messages().len(), 1);
    assert_eq!(h.queue.jobs().len(), 1);
}

#[tokio::test]
async fn short_messages_are_skipped_and_leave_no_ledger_row() {
    let h = harness();
    h.store.add_source(SourceType::Whatsapp, GROUP, true);

    // Ten characters, well under the minimum body length.
    let envelope = chat_envelope("m1", GROUP, "hello crew", 60);
    let decision = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::InsufficientText)
    ));

    // A skip before the ledger write must not poison a later, longer
    // message with the same id.
    assert!(h.store.processed_messages().is_empty());
}

#[tokio::test]
async fn caption_text_passes_the_length_check() {
    let h = harness();
    let source = h.store.add_source(SourceType::Whatsapp, GROUP, true);

    let envelope: server_core::domains::intake::envelope::WebhookEnvelope =
        serde_json::from_value(serde_json::json!({
            "event": "message",
            "data": {
                "id": "m-img",
                "chatId": GROUP,
                "timestamp": chrono::Utc::now().timestamp(),
                "image": { "caption": LONG_BODY },
            }
        }))
        .unwrap();

    let decision = h.filter.ingest_chat(&envelope).await.unwrap();
    assert!(matches!(decision, IntakeDecision::Queued { .. }));

    // Source activity stamp moves on successful intake.
    assert!(h.store.source(source.id).unwrap().last_processed_at.is_some());
}

#[tokio::test]
async fn scrape_intake_uses_the_page_url_as_identity() {
    let h = harness();
    let source = h.store.add_source(SourceType::Web, "https://castings.example", true);
    let url = "https://castings.example/calls/42";
    let content = "Casting call: lead actor needed for a feature film in Riyadh.";

    let first = h.filter.ingest_scrape(source.id, url, content).await.unwrap();
    assert!(matches!(first, IntakeDecision::Queued { .. }));

    let again = h.filter.ingest_scrape(source.id, url, content).await.unwrap();
    assert!(matches!(
        again,
        IntakeDecision::Skipped(SkipReason::AlreadyProcessed)
    ));
}

#[tokio::test]
async fn scrape_intake_rejects_unknown_and_inactive_sources() {
    let h = harness();
    let inactive = h.store.add_source(SourceType::Web, "https://old.example", false);

    let decision = h
        .filter
        .ingest_scrape(inactive.id, "https://old.example/p", "long enough casting page content here")
        .await
        .unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::UnknownSource)
    ));

    let decision = h
        .filter
        .ingest_scrape(uuid::Uuid::new_v4(), "https://x.example/p", "long enough casting page content here")
        .await
        .unwrap();
    assert!(matches!(
        decision,
        IntakeDecision::Skipped(SkipReason::UnknownSource)
    ));
}
