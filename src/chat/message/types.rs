//! Message row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media behind a message's `media_url`, inferred from the uploaded
/// file's MIME type and persisted with the row so rendering survives a
/// refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    /// Maps a MIME type to a kind. Anything that is not image, video or
    /// audio renders as a downloadable document.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else if mime.starts_with("audio/") {
            MediaKind::Audio
        } else {
            MediaKind::Document
        }
    }
}

/// A stored message row. Immutable once created; the client never updates or
/// deletes rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_kind: Option<MediaKind>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new message. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
}

/// Feed ordering: `created_at` ascending, ties broken by `id`.
pub fn sort_feed_order(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(id: &str, secs: i64) -> Message {
        Message {
            id: id.to_string(),
            conversation_id: None,
            sender_id: "u".to_string(),
            content: String::new(),
            media_url: None,
            media_kind: None,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("audio/ogg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Document);
        assert_eq!(MediaKind::from_mime("text/plain"), MediaKind::Document);
    }

    #[test]
    fn sort_orders_by_created_at_then_id() {
        let mut rows = vec![msg("b", 20), msg("c", 10), msg("a", 20)];
        sort_feed_order(&mut rows);
        let ids: Vec<&str> = rows.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn message_row_parses_without_media() {
        let body = r#"{
            "id": "m1",
            "conversation_id": null,
            "sender_id": "user-1",
            "content": "hello",
            "created_at": "2026-01-05T10:00:00Z"
        }"#;
        let row: Message = serde_json::from_str(body).unwrap();
        assert!(row.media_url.is_none());
        assert!(row.media_kind.is_none());
    }

    #[test]
    fn new_message_omits_empty_media_fields() {
        let row = NewMessage {
            conversation_id: None,
            sender_id: "user-1".to_string(),
            content: "hi".to_string(),
            media_url: None,
            media_kind: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("media_url").is_none());
        assert!(json.get("conversation_id").is_none());
    }
}
