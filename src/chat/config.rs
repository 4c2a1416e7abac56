//! Client configuration.

/// Chat backend configuration.
///
/// All service endpoints are derived from a single project base URL, the way
/// the hosted platform lays them out.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Project base URL, e.g. `https://project.example.co`
    pub base_url: String,
    /// Anonymous API key, sent with every request.
    pub api_key: String,
    /// Storage bucket holding message attachments.
    pub attachment_bucket: String,
    /// Conversation the feed is scoped to. `None` means the implicit global
    /// conversation.
    pub conversation_id: Option<String>,
    /// Realtime heartbeat interval in seconds.
    pub heartbeat_secs: u64,
    /// Optional path for the session cache file. `None` disables caching.
    pub session_cache_path: Option<std::path::PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            attachment_bucket: "attachments".to_string(),
            conversation_id: None,
            heartbeat_secs: 30,
            session_cache_path: None,
        }
    }

    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base_url)
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url)
    }

    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.base_url)
    }

    /// Websocket endpoint for the realtime channel.
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, self.api_key
        )
    }
}
