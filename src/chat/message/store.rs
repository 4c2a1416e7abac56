//! Message store access.
//!
//! [`MessageBackend`] is the seam between the feed controller and the
//! relational table; [`MessageApi`] is the HTTP implementation against the
//! hosted REST surface.

use crate::chat::config::ClientConfig;
use crate::chat::error::{ChatError, Result};
use crate::chat::http::read_success_json;
use crate::chat::message::types::{Message, NewMessage};
use crate::chat::session::SessionStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Insert and ordered fetch on the `messages` table.
#[async_trait]
pub trait MessageBackend: Send + Sync {
    /// Inserts one row and returns it as stored (id and timestamp assigned
    /// by the store).
    async fn insert(&self, row: NewMessage) -> Result<Message>;

    /// Fetches all rows, ordered by `created_at` ascending with ties broken
    /// by `id`, optionally filtered by conversation.
    async fn fetch_ordered(&self, conversation_id: Option<&str>) -> Result<Vec<Message>>;
}

/// REST implementation of [`MessageBackend`].
pub struct MessageApi {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
    session: Arc<SessionStore>,
}

impl MessageApi {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_url: config.rest_url(),
            api_key: config.api_key.clone(),
            session,
        }
    }

    fn bearer(&self) -> String {
        self.session.bearer(&self.api_key)
    }
}

#[async_trait]
impl MessageBackend for MessageApi {
    async fn insert(&self, row: NewMessage) -> Result<Message> {
        let url = format!("{}/messages", self.rest_url);
        debug!("[MsgAPI] inserting message for sender {}", row.sender_id);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| ChatError::Insert(format!("insert request: {e}")))?;

        let mut rows: Vec<Message> = read_success_json(response, "message insert")
            .await
            .map_err(ChatError::Insert)?;
        let stored = rows
            .pop()
            .ok_or_else(|| ChatError::Insert("store returned no representation".to_string()))?;

        info!("[MsgAPI] message {} stored", stored.id);
        Ok(stored)
    }

    async fn fetch_ordered(&self, conversation_id: Option<&str>) -> Result<Vec<Message>> {
        let url = format!("{}/messages", self.rest_url);
        let mut query: Vec<(String, String)> = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "created_at.asc,id.asc".to_string()),
        ];
        if let Some(conversation) = conversation_id {
            query.push(("conversation_id".to_string(), format!("eq.{conversation}")));
        }
        debug!("[MsgAPI] fetching feed (conversation={:?})", conversation_id);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| ChatError::Fetch(format!("fetch request: {e}")))?;

        let rows: Vec<Message> = read_success_json(response, "feed fetch")
            .await
            .map_err(ChatError::Fetch)?;
        debug!("[MsgAPI] fetched {} rows", rows.len());
        Ok(rows)
    }
}
