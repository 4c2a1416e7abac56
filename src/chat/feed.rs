//! Feed controller.
//!
//! The one component with sequencing logic: turns user actions into store
//! writes and store/notifier events into the rendered feed. The remote store
//! stays the store of record; the in-memory feed is always a full replace
//! from a fetch, never a merge, so it can hold no duplicates and no
//! unconfirmed local entries.

use crate::chat::error::{ChatError, Result};
use crate::chat::listener::FeedListener;
use crate::chat::message::store::MessageBackend;
use crate::chat::message::types::{sort_feed_order, MediaKind, Message, NewMessage};
use crate::chat::session::SessionStore;
use crate::chat::storage::{check_size, object_path, AttachmentBackend};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// One rendered feed row.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub message: Message,
    /// Whether the current identity sent this message.
    pub is_own: bool,
}

pub struct FeedController {
    session: Arc<SessionStore>,
    messages: Arc<dyn MessageBackend>,
    attachments: Arc<dyn AttachmentBackend>,
    listener: Arc<dyn FeedListener>,
    conversation_id: Option<String>,
    feed: Mutex<Vec<FeedEntry>>,
}

impl FeedController {
    pub fn new(
        session: Arc<SessionStore>,
        messages: Arc<dyn MessageBackend>,
        attachments: Arc<dyn AttachmentBackend>,
        listener: Arc<dyn FeedListener>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            session,
            messages,
            attachments,
            listener,
            conversation_id,
            feed: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the current feed.
    pub fn feed(&self) -> Vec<FeedEntry> {
        self.feed.lock().expect("feed lock poisoned").clone()
    }

    /// Sends a plain text message attributed to the current identity.
    ///
    /// Without a session no store write happens at all. A store rejection is
    /// surfaced as a notice and not retried.
    pub async fn send_text(&self, content: &str) -> Result<Message> {
        let session = self.session.current().ok_or(ChatError::NotSignedIn)?;
        let row = NewMessage {
            conversation_id: self.conversation_id.clone(),
            sender_id: session.user_id,
            content: content.to_string(),
            media_url: None,
            media_kind: None,
        };
        match self.messages.insert(row).await {
            Ok(stored) => {
                debug!("[Feed] text message {} accepted", stored.id);
                Ok(stored)
            }
            Err(e) => {
                self.listener.on_notice(format!("message not sent: {e}")).await;
                Err(e)
            }
        }
    }

    /// Sends a file attachment: upload first, then the message row pointing
    /// at the uploaded object.
    ///
    /// The size limit is checked before anything touches the network. An
    /// upload failure means no message row is created. An insert failure
    /// after a successful upload leaves the object orphaned in storage;
    /// that gap is logged, not compensated.
    pub async fn send_attachment(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<Message> {
        if let Err(e) = check_size(bytes.len()) {
            self.listener.on_notice(e.to_string()).await;
            return Err(e);
        }
        let session = self.session.current().ok_or(ChatError::NotSignedIn)?;

        let path = object_path(&session.user_id, file_name);
        if let Err(e) = self.attachments.upload(&path, mime, bytes).await {
            self.listener
                .on_notice(format!("attachment not uploaded: {e}"))
                .await;
            return Err(e);
        }

        let row = NewMessage {
            conversation_id: self.conversation_id.clone(),
            sender_id: session.user_id,
            content: file_name.to_string(),
            media_url: Some(self.attachments.public_url(&path)),
            media_kind: Some(MediaKind::from_mime(mime)),
        };
        match self.messages.insert(row).await {
            Ok(stored) => {
                info!("[Feed] attachment message {} accepted", stored.id);
                Ok(stored)
            }
            Err(e) => {
                warn!("[Feed] insert failed after upload, {} is orphaned", path);
                self.listener.on_notice(format!("message not sent: {e}")).await;
                Err(e)
            }
        }
    }

    /// Reloads the feed from the store and replaces the in-memory list.
    pub async fn load_feed(&self) -> Result<()> {
        let mut rows = match self
            .messages
            .fetch_ordered(self.conversation_id.as_deref())
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                self.listener
                    .on_notice(format!("feed not refreshed: {e}"))
                    .await;
                return Err(e);
            }
        };
        sort_feed_order(&mut rows);

        let own_id = self.session.current().map(|s| s.user_id);
        let entries: Vec<FeedEntry> = rows
            .into_iter()
            .map(|message| {
                let is_own = own_id.as_deref() == Some(message.sender_id.as_str());
                FeedEntry { message, is_own }
            })
            .collect();
        let count = entries.len();
        *self.feed.lock().expect("feed lock poisoned") = entries;

        debug!("[Feed] reloaded, {} entries", count);
        self.listener.on_feed_reloaded(count).await;
        Ok(())
    }

    /// Realtime insert notification. The event body is only a wake-up; the
    /// feed is re-read from the store of record so it can never go stale
    /// relative to it.
    pub async fn on_remote_insert(&self) {
        if let Err(e) = self.load_feed().await {
            warn!("[Feed] reload after remote insert failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::auth::Session;
    use crate::chat::listener::EmptyFeedListener;
    use crate::chat::storage::MAX_ATTACHMENT_BYTES;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory message table assigning ids and timestamps in insert order.
    struct MockMessageStore {
        rows: Mutex<Vec<Message>>,
        insert_calls: AtomicUsize,
        fail_insert: AtomicBool,
        fail_fetch: AtomicBool,
    }

    impl MockMessageStore {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                insert_calls: AtomicUsize::new(0),
                fail_insert: AtomicBool::new(false),
                fail_fetch: AtomicBool::new(false),
            }
        }

        fn seed(&self, rows: Vec<Message>) {
            *self.rows.lock().unwrap() = rows;
        }
    }

    #[async_trait::async_trait]
    impl MessageBackend for MockMessageStore {
        async fn insert(&self, row: NewMessage) -> Result<Message> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(ChatError::Insert("row rejected".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            let stored = Message {
                id: format!("m{}", rows.len() + 1),
                conversation_id: row.conversation_id,
                sender_id: row.sender_id,
                content: row.content,
                media_url: row.media_url,
                media_kind: row.media_kind,
                created_at: Utc.timestamp_opt(1_000 + rows.len() as i64, 0).unwrap(),
            };
            rows.push(stored.clone());
            Ok(stored)
        }

        async fn fetch_ordered(&self, conversation_id: Option<&str>) -> Result<Vec<Message>> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(ChatError::Fetch("read rejected".to_string()));
            }
            let mut rows: Vec<Message> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|m| match conversation_id {
                    Some(c) => m.conversation_id.as_deref() == Some(c),
                    None => true,
                })
                .cloned()
                .collect();
            sort_feed_order(&mut rows);
            Ok(rows)
        }
    }

    struct MockAttachmentStore {
        upload_calls: AtomicUsize,
        fail_upload: AtomicBool,
    }

    impl MockAttachmentStore {
        fn new() -> Self {
            Self {
                upload_calls: AtomicUsize::new(0),
                fail_upload: AtomicBool::new(false),
            }
        }
    }

    #[async_trait::async_trait]
    impl AttachmentBackend for MockAttachmentStore {
        async fn upload(&self, _path: &str, _content_type: &str, _bytes: Vec<u8>) -> Result<()> {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_upload.load(Ordering::SeqCst) {
                return Err(ChatError::Upload("bucket rejected".to_string()));
            }
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("https://cdn.test/public/{path}")
        }
    }

    fn signed_in_session() -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::new(None));
        store.store(Session {
            access_token: "tok".to_string(),
            user_id: "user-1".to_string(),
            email: "a@b.co".to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        });
        store
    }

    struct Fixture {
        controller: FeedController,
        messages: Arc<MockMessageStore>,
        attachments: Arc<MockAttachmentStore>,
    }

    fn fixture_with(messages: MockMessageStore, attachments: MockAttachmentStore) -> Fixture {
        let messages = Arc::new(messages);
        let attachments = Arc::new(attachments);
        let controller = FeedController::new(
            signed_in_session(),
            messages.clone(),
            attachments.clone(),
            Arc::new(EmptyFeedListener),
            None,
        );
        Fixture {
            controller,
            messages,
            attachments,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockMessageStore::new(), MockAttachmentStore::new())
    }

    fn stored(id: &str, sender: &str, secs: i64, content: &str) -> Message {
        Message {
            id: id.to_string(),
            conversation_id: None,
            sender_id: sender.to_string(),
            content: content.to_string(),
            media_url: None,
            media_kind: None,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn send_text_produces_one_own_entry() {
        let f = fixture();
        f.controller.send_text("hello").await.unwrap();
        f.controller.load_feed().await.unwrap();

        let feed = f.controller.feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].message.content, "hello");
        assert!(feed[0].message.media_url.is_none());
        assert!(feed[0].is_own);
    }

    #[tokio::test]
    async fn send_text_without_session_skips_the_store() {
        let messages = Arc::new(MockMessageStore::new());
        let controller = FeedController::new(
            Arc::new(SessionStore::new(None)),
            messages.clone(),
            Arc::new(MockAttachmentStore::new()),
            Arc::new(EmptyFeedListener),
            None,
        );
        let err = controller.send_text("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::NotSignedIn));
        assert_eq!(messages.insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_feed_orders_by_time_then_id() {
        let f = fixture();
        f.messages.seed(vec![
            stored("b", "peer", 20, "second-tie"),
            stored("c", "peer", 10, "first"),
            stored("a", "peer", 20, "first-tie"),
        ]);
        f.controller.load_feed().await.unwrap();
        let ids: Vec<String> = f
            .controller
            .feed()
            .iter()
            .map(|e| e.message.id.clone())
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn load_feed_is_a_full_replace() {
        let f = fixture();
        f.messages.seed(vec![stored("x", "peer", 5, "old")]);
        f.controller.load_feed().await.unwrap();
        assert_eq!(f.controller.feed().len(), 1);

        f.messages.seed(vec![
            stored("y", "peer", 6, "new-1"),
            stored("z", "peer", 7, "new-2"),
        ]);
        f.controller.load_feed().await.unwrap();

        let feed = f.controller.feed();
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|e| e.message.id != "x"));
    }

    #[tokio::test]
    async fn attachment_flow_uploads_once_then_inserts_once() {
        let f = fixture();
        let bytes = vec![0u8; 2 * 1024 * 1024];
        let sent = f
            .controller
            .send_attachment("holiday.png", "image/png", bytes)
            .await
            .unwrap();

        assert_eq!(f.attachments.upload_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.messages.insert_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sent.content, "holiday.png");
        assert_eq!(sent.media_kind, Some(MediaKind::Image));
        let url = sent.media_url.unwrap();
        assert!(url.starts_with("https://cdn.test/public/user-1/"));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn failed_upload_never_inserts_a_row() {
        let f = fixture();
        f.attachments.fail_upload.store(true, Ordering::SeqCst);

        let err = f
            .controller
            .send_attachment("clip.mp4", "video/mp4", vec![0u8; 128])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Upload(_)));
        assert_eq!(f.messages.insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_any_backend_call() {
        let f = fixture();
        let err = f
            .controller
            .send_attachment("big.iso", "application/octet-stream", vec![0u8; MAX_ATTACHMENT_BYTES + 1])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::AttachmentTooLarge { .. }));
        assert_eq!(f.attachments.upload_calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.messages.insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_insert_matches_an_immediate_fetch() {
        let f = fixture();
        f.messages.seed(vec![stored("a", "peer", 1, "hi")]);
        f.controller.load_feed().await.unwrap();

        // A peer insert lands in the store behind our back.
        f.messages.seed(vec![
            stored("a", "peer", 1, "hi"),
            stored("b", "peer", 2, "there"),
        ]);
        f.controller.on_remote_insert().await;

        let feed_ids: Vec<String> = f
            .controller
            .feed()
            .iter()
            .map(|e| e.message.id.clone())
            .collect();
        let fetched: Vec<String> = f
            .messages
            .fetch_ordered(None)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id.clone())
            .collect();
        assert_eq!(feed_ids, fetched);
    }

    #[tokio::test]
    async fn failed_insert_surfaces_and_does_not_panic() {
        let f = fixture();
        f.messages.fail_insert.store(true, Ordering::SeqCst);

        let err = f.controller.send_text("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Insert(_)));
        assert!(f.controller.feed().is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_previous_feed() {
        let f = fixture();
        f.messages.seed(vec![stored("a", "peer", 1, "hi")]);
        f.controller.load_feed().await.unwrap();

        f.messages.fail_fetch.store(true, Ordering::SeqCst);
        let err = f.controller.load_feed().await.unwrap_err();
        assert!(matches!(err, ChatError::Fetch(_)));
        assert_eq!(f.controller.feed().len(), 1);
    }
}
