//! Feed event callbacks.
//!
//! Callers register a [`FeedListener`] to render the feed and surface
//! transient notices; the SDK never renders anything itself.

use async_trait::async_trait;

#[async_trait]
pub trait FeedListener: Send + Sync {
    /// The in-memory feed was replaced by a fresh fetch.
    ///
    /// `entry_count` is the new feed length; read the entries through
    /// `FeedController::feed`.
    async fn on_feed_reloaded(&self, entry_count: usize);

    /// An operation failed and should be shown to the user as a transient
    /// notice. Nothing is retried automatically.
    async fn on_notice(&self, notice: String);

    /// The realtime subscription was established or released.
    async fn on_subscription_changed(&self, subscribed: bool);
}

/// Default no-op listener.
pub struct EmptyFeedListener;

#[async_trait]
impl FeedListener for EmptyFeedListener {
    async fn on_feed_reloaded(&self, _entry_count: usize) {}
    async fn on_notice(&self, _notice: String) {}
    async fn on_subscription_changed(&self, _subscribed: bool) {}
}
