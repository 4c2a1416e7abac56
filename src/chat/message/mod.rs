//! Message store wrapper: row types plus insert/ordered-fetch access.

pub mod store;
pub mod types;

pub use store::{MessageApi, MessageBackend};
pub use types::{MediaKind, Message, NewMessage};
