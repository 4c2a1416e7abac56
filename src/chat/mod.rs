pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub(crate) mod http;
pub mod listener;
pub mod message;
pub mod profile;
pub mod realtime;
pub mod routes;
pub mod session;
pub mod storage;
