//! Chat client tying the collaborators together.
//!
//! Owns the configuration, the session store, the API clients and the
//! realtime notifier. `connect()` builds the feed controller, loads the
//! initial feed and joins the realtime channel; `disconnect()` releases it.

use crate::chat::auth::AuthApi;
use crate::chat::config::ClientConfig;
use crate::chat::error::{ChatError, Result};
use crate::chat::feed::FeedController;
use crate::chat::listener::{EmptyFeedListener, FeedListener};
use crate::chat::message::store::MessageApi;
use crate::chat::profile::{Profile, ProfileApi};
use crate::chat::realtime::{RealtimeNotifier, SubscriptionState};
use crate::chat::routes::{resolve, Route, RouteDecision};
use crate::chat::session::SessionStore;
use crate::chat::storage::StorageApi;
use std::sync::Arc;
use tracing::info;

pub struct ChatClient {
    config: ClientConfig,
    auth: AuthApi,
    profiles: ProfileApi,
    session: Arc<SessionStore>,
    listener: Arc<dyn FeedListener>,
    controller: Option<Arc<FeedController>>,
    notifier: RealtimeNotifier,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        let session = Arc::new(SessionStore::new(config.session_cache_path.clone()));
        let _ = session.load_cached();
        Self {
            auth: AuthApi::new(&config),
            profiles: ProfileApi::new(&config, session.clone()),
            session: session.clone(),
            listener: Arc::new(EmptyFeedListener),
            controller: None,
            notifier: RealtimeNotifier::new(config.clone()),
            config,
        }
    }

    /// Registers the feed listener. Takes effect on the next `connect()`.
    pub fn set_feed_listener(&mut self, listener: Arc<dyn FeedListener>) {
        self.listener = listener;
    }

    pub fn session(&self) -> Arc<SessionStore> {
        self.session.clone()
    }

    pub fn auth(&self) -> &AuthApi {
        &self.auth
    }

    /// Feed controller, available once connected.
    pub fn controller(&self) -> Option<Arc<FeedController>> {
        self.controller.clone()
    }

    /// Gates a client-side route against the current session.
    pub fn route(&self, path: &str) -> RouteDecision {
        resolve(Route::parse(path), self.session.is_signed_in())
    }

    pub async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<()> {
        self.auth.sign_up(email, password, username).await
    }

    /// Signs in and installs the session as the source of truth.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let session = self.auth.sign_in(email, password).await?;
        self.session.store(session);
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        self.auth.request_password_reset(email).await
    }

    /// Contact directory for the sidebar, with the static presence label.
    pub async fn fetch_profiles(&self) -> Result<Vec<Profile>> {
        self.profiles.fetch_profiles().await
    }

    /// Signs out and invalidates the session cache. An open realtime
    /// subscription stays up until `disconnect()`.
    pub fn sign_out(&self) {
        self.session.clear();
    }

    /// Builds the feed controller, loads the feed once and subscribes to
    /// insert notifications.
    pub async fn connect(&mut self) -> Result<()> {
        if self.notifier.state() == SubscriptionState::Subscribed {
            return Ok(());
        }
        if !self.session.is_signed_in() {
            return Err(ChatError::NotSignedIn);
        }

        let controller = Arc::new(FeedController::new(
            self.session.clone(),
            Arc::new(MessageApi::new(&self.config, self.session.clone())),
            Arc::new(StorageApi::new(&self.config)),
            self.listener.clone(),
            self.config.conversation_id.clone(),
        ));
        controller.load_feed().await?;

        self.notifier
            .subscribe(controller.clone(), self.listener.clone())
            .await?;
        self.controller = Some(controller);
        info!("[Client] connected, feed live");
        Ok(())
    }

    /// Leaves the realtime channel and drops the controller.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.notifier.unsubscribe(self.listener.clone()).await?;
        self.controller = None;
        Ok(())
    }
}
