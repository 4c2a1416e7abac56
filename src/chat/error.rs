//! Error taxonomy for the chat client.
//!
//! Every backend surface gets its own variant so call sites can classify
//! failures into a user-facing notice. Nothing here is retried automatically
//! and nothing is fatal: the caller reports the error and the user retries
//! the action manually.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Sign-up, sign-in or password-reset rejected by the auth service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// An operation that needs an authenticated identity was called without
    /// a session. No backend call is made in this case.
    #[error("not signed in")]
    NotSignedIn,

    /// The attachment store rejected an upload.
    #[error("upload failed: {0}")]
    Upload(String),

    /// Attachment rejected client-side, before any network call.
    #[error("attachment is {size} bytes, over the {limit} byte limit")]
    AttachmentTooLarge { size: usize, limit: usize },

    /// The message store rejected a row insert.
    #[error("message insert failed: {0}")]
    Insert(String),

    /// The message store rejected an ordered feed read.
    #[error("feed fetch failed: {0}")]
    Fetch(String),

    /// The realtime channel could not be joined, left or read.
    #[error("realtime channel error: {0}")]
    Realtime(String),
}

pub type Result<T> = std::result::Result<T, ChatError>;
