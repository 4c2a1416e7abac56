//! Shared HTTP response handling.
//!
//! The backend reports failures as non-2xx statuses with a small JSON body
//! whose message field varies per service (`message`, `msg`, `error`,
//! `error_description`). All API clients funnel responses through here so the
//! classification at the call site only has to pick an error variant.

use tracing::{debug, error};

/// Extracts a human-readable message from an error body, falling back to the
/// raw body text.
fn server_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    body.to_string()
}

/// Reads a response body, turning non-2xx statuses into an `Err(String)`
/// the caller wraps into its own error variant.
pub(crate) async fn read_success_body(
    response: reqwest::Response,
    operation: &str,
) -> std::result::Result<Vec<u8>, String> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| format!("reading response body: {e}"))?;

    if !status.is_success() {
        let text = String::from_utf8_lossy(&body);
        let message = server_message(&text);
        error!("[HTTP] {} failed, status {}: {}", operation, status, message);
        return Err(format!("{} ({})", message, status));
    }
    debug!("[HTTP] {} succeeded, status {}", operation, status);
    Ok(body.to_vec())
}

/// Reads a response and deserializes its body.
pub(crate) async fn read_success_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> std::result::Result<T, String> {
    let body = read_success_body(response, operation).await?;
    serde_json::from_slice(&body).map_err(|e| {
        let text = String::from_utf8_lossy(&body);
        error!("[HTTP] {} response did not parse: {e}, body: {text}", operation);
        format!("unexpected response shape: {e}")
    })
}
