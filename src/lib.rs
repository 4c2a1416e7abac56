pub mod chat;

// Re-export the types most embedders need.
pub use chat::{
    auth::Session,
    client::ChatClient,
    config::ClientConfig,
    error::ChatError,
    feed::{FeedController, FeedEntry},
    listener::{EmptyFeedListener, FeedListener},
    message::{MediaKind, Message, NewMessage},
    profile::{PresenceStatus, Profile},
    routes::{Route, RouteDecision},
};
