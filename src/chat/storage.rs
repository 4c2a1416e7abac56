//! Attachment store access.
//!
//! Wraps the object-storage surface: upload bytes under a caller-chosen path
//! and derive the publicly addressable URL for that path. The 10 MiB limit
//! is enforced here, client-side, so an oversized file never reaches the
//! network.

use crate::chat::config::ClientConfig;
use crate::chat::error::{ChatError, Result};
use crate::chat::http::read_success_body;
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// Client-side attachment size limit.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Upload and public-URL derivation on the attachment bucket.
#[async_trait]
pub trait AttachmentBackend: Send + Sync {
    /// Uploads `bytes` under `path`. Success is opaque; the URL comes from
    /// [`AttachmentBackend::public_url`].
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<()>;

    /// Publicly addressable URL for an uploaded path.
    fn public_url(&self, path: &str) -> String;
}

/// Builds the storage path for an upload: namespaced by the uploading user,
/// with a random file name that preserves the original extension.
pub fn object_path(user_id: &str, file_name: &str) -> String {
    let name = Uuid::new_v4();
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{user_id}/{name}.{ext}")
        }
        _ => format!("{user_id}/{name}"),
    }
}

/// Checks the client-side size limit.
pub fn check_size(size: usize) -> Result<()> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(ChatError::AttachmentTooLarge {
            size,
            limit: MAX_ATTACHMENT_BYTES,
        });
    }
    Ok(())
}

/// HTTP implementation of [`AttachmentBackend`].
pub struct StorageApi {
    client: reqwest::Client,
    storage_url: String,
    api_key: String,
    bucket: String,
}

impl StorageApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            storage_url: config.storage_url(),
            api_key: config.api_key.clone(),
            bucket: config.attachment_bucket.clone(),
        }
    }
}

#[async_trait]
impl AttachmentBackend for StorageApi {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        check_size(bytes.len())?;
        let url = format!("{}/object/{}/{}", self.storage_url, self.bucket, path);
        debug!("[Storage] uploading {} bytes to {}", bytes.len(), path);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ChatError::Upload(format!("upload request: {e}")))?;

        read_success_body(response, "attachment upload")
            .await
            .map_err(ChatError::Upload)?;
        info!("[Storage] uploaded {}", path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.storage_url, self.bucket, path)
    }
}
