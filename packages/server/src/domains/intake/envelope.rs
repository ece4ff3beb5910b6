//! Webhook event envelope for chat sources.
//!
//! The transport layer (webhook platform) delivers message-creation events
//! as JSON; only the fields the intake filter needs are modeled here.

use serde::Deserialize;

/// Top-level webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    /// Event type discriminator, e.g. "message".
    pub event: String,
    pub data: MessageData,
}

/// The message-creation event body.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageData {
    /// External message identifier, unique per source type.
    pub id: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
    /// Seconds since epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub image: Option<CaptionedMedia>,
    #[serde(default)]
    pub video: Option<CaptionedMedia>,
    #[serde(default)]
    pub document: Option<CaptionedMedia>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionedMedia {
    #[serde(default)]
    pub caption: Option<String>,
}

impl MessageData {
    /// Extract the first non-empty candidate text, in priority order:
    /// text body, image caption, video caption, document caption.
    pub fn extract_text(&self) -> Option<&str> {
        let candidates = [
            self.text.as_ref().and_then(|t| t.body.as_deref()),
            self.image.as_ref().and_then(|m| m.caption.as_deref()),
            self.video.as_ref().and_then(|m| m.caption.as_deref()),
            self.document.as_ref().and_then(|m| m.caption.as_deref()),
        ];

        candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }

    /// Synthesized source URL for records produced from this message.
    pub fn source_url(&self) -> String {
        format!("whatsapp://group/{}/message/{}", self.chat_id, self.id)
    }

    /// Whether the message is addressed to a group-style chat identifier.
    pub fn is_group_message(&self) -> bool {
        self.chat_id.ends_with("@g.us")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: serde_json::Value) -> WebhookEnvelope {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn text_body_takes_priority_over_captions() {
        let env = envelope(serde_json::json!({
            "event": "message",
            "data": {
                "id": "m1",
                "chatId": "123@g.us",
                "timestamp": 1_700_000_000,
                "text": { "body": "from text" },
                "image": { "caption": "from image" },
            }
        }));
        assert_eq!(env.data.extract_text(), Some("from text"));
    }

    #[test]
    fn caption_priority_order_is_image_video_document() {
        let env = envelope(serde_json::json!({
            "event": "message",
            "data": {
                "id": "m1",
                "chatId": "123@g.us",
                "timestamp": 1_700_000_000,
                "video": { "caption": "from video" },
                "document": { "caption": "from document" },
            }
        }));
        assert_eq!(env.data.extract_text(), Some("from video"));
    }

    #[test]
    fn blank_candidates_are_skipped() {
        let env = envelope(serde_json::json!({
            "event": "message",
            "data": {
                "id": "m1",
                "chatId": "123@g.us",
                "timestamp": 1_700_000_000,
                "text": { "body": "   " },
                "image": { "caption": "real caption" },
            }
        }));
        assert_eq!(env.data.extract_text(), Some("real caption"));
    }

    #[test]
    fn no_text_anywhere_yields_none() {
        let env = envelope(serde_json::json!({
            "event": "message",
            "data": { "id": "m1", "chatId": "123@g.us", "timestamp": 1_700_000_000 }
        }));
        assert_eq!(env.data.extract_text(), None);
    }

    #[test]
    fn source_url_shape() {
        let env = envelope(serde_json::json!({
            "event": "message",
            "data": { "id": "m7", "chatId": "120363X@g.us", "timestamp": 1_700_000_000 }
        }));
        assert_eq!(
            env.data.source_url(),
            "whatsapp://group/120363X@g.us/message/m7"
        );
    }

    #[test]
    fn group_detection() {
        let group = envelope(serde_json::json!({
            "event": "message",
            "data": { "id": "m1", "chatId": "120363X@g.us", "timestamp": 0 }
        }));
        assert!(group.data.is_group_message());

        let direct = envelope(serde_json::json!({
            "event": "message",
            "data": { "id": "m1", "chatId": "9665xxxxxxx@c.us", "timestamp": 0 }
        }));
        assert!(!direct.data.is_group_message());
    }
}
