//! Session state.
//!
//! The in-memory [`Session`] is the single source of truth for "who is
//! signed in". The optional cache file is exactly that, a cache: it is
//! written on store, read once on startup, and removed on clear. Nothing
//! gates on the file once a session is loaded.

use crate::chat::auth::Session;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, warn};

pub struct SessionStore {
    current: RwLock<Option<Session>>,
    cache_path: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(cache_path: Option<PathBuf>) -> Self {
        Self {
            current: RwLock::new(None),
            cache_path,
        }
    }

    /// Current session, if signed in.
    pub fn current(&self) -> Option<Session> {
        self.current.read().expect("session lock poisoned").clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().expect("session lock poisoned").is_some()
    }

    /// Bearer token for REST calls: the session token when signed in, the
    /// anon key otherwise. Row-level policies on the store decide what each
    /// may do.
    pub fn bearer(&self, anon_key: &str) -> String {
        self.current()
            .map(|s| s.access_token)
            .unwrap_or_else(|| anon_key.to_string())
    }

    /// Installs a session and refreshes the cache file. Cache write failures
    /// are logged and ignored; the in-memory session still wins.
    pub fn store(&self, session: Session) {
        if let Some(path) = &self.cache_path {
            match serde_json::to_vec(&session) {
                Ok(bytes) => {
                    if let Err(e) = std::fs::write(path, bytes) {
                        warn!("[Session] cache write to {:?} failed: {}", path, e);
                    }
                }
                Err(e) => warn!("[Session] cache serialization failed: {}", e),
            }
        }
        *self.current.write().expect("session lock poisoned") = Some(session);
    }

    /// Loads a cached session, if one exists and has not expired.
    pub fn load_cached(&self) -> Option<Session> {
        let path = self.cache_path.as_ref()?;
        let bytes = std::fs::read(path).ok()?;
        let session: Session = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(e) => {
                warn!("[Session] cache at {:?} unreadable, discarding: {}", path, e);
                let _ = std::fs::remove_file(path);
                return None;
            }
        };
        if session.expires_at <= chrono::Utc::now() {
            debug!("[Session] cached session expired, discarding");
            let _ = std::fs::remove_file(path);
            return None;
        }
        *self.current.write().expect("session lock poisoned") = Some(session.clone());
        Some(session)
    }

    /// Signs out: drops the in-memory session and invalidates the cache.
    pub fn clear(&self) {
        *self.current.write().expect("session lock poisoned") = None;
        if let Some(path) = &self.cache_path {
            let _ = std::fs::remove_file(path);
        }
    }
}
