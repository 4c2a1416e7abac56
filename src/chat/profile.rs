//! Profile directory.
//!
//! Read-only view of the `profiles` table that backs the contact list. The
//! status column is a static label maintained by the backend; there is no
//! presence protocol behind it.

use crate::chat::config::ClientConfig;
use crate::chat::error::{ChatError, Result};
use crate::chat::http::read_success_json;
use crate::chat::session::SessionStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Static presence label only; there is no presence protocol behind this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

impl PresenceStatus {
    /// Display label for the contact list.
    pub fn label(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "Online",
            PresenceStatus::Offline => "Offline",
        }
    }
}

/// A user profile row as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub status: PresenceStatus,
    pub last_seen: DateTime<Utc>,
}

/// REST client for the profile directory.
pub struct ProfileApi {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
    session: Arc<SessionStore>,
}

impl ProfileApi {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_url: config.rest_url(),
            api_key: config.api_key.clone(),
            session,
        }
    }

    /// Fetches all profiles, ordered by username.
    pub async fn fetch_profiles(&self) -> Result<Vec<Profile>> {
        let url = format!("{}/profiles", self.rest_url);
        debug!("[ProfileAPI] fetching profile directory");

        let response = self
            .client
            .get(&url)
            .query(&[("select", "*"), ("order", "username.asc")])
            .header("apikey", &self.api_key)
            .bearer_auth(self.session.bearer(&self.api_key))
            .send()
            .await
            .map_err(|e| ChatError::Fetch(format!("profile fetch request: {e}")))?;

        let rows: Vec<Profile> = read_success_json(response, "profile fetch")
            .await
            .map_err(ChatError::Fetch)?;
        debug!("[ProfileAPI] fetched {} profiles", rows.len());
        Ok(rows)
    }
}
