//! Auth service client.
//!
//! Sign-up, sign-in and password reset against the hosted auth endpoints.
//! Sign-in produces a [`Session`] that the rest of the SDK attaches as a
//! bearer token.

use crate::chat::config::ClientConfig;
use crate::chat::error::{ChatError, Result};
use crate::chat::http::{read_success_body, read_success_json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: String,
}

/// Auth HTTP API client.
pub struct AuthApi {
    client: reqwest::Client,
    auth_url: String,
    api_key: String,
}

impl AuthApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_url: config.auth_url(),
            api_key: config.api_key.clone(),
        }
    }

    /// Registers a new account. The display name travels as user metadata.
    pub async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<()> {
        let url = format!("{}/signup", self.auth_url);
        debug!("[Auth] sign-up request for {}", email);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&SignUpRequest {
                email,
                password,
                data: SignUpMetadata { username },
            })
            .send()
            .await
            .map_err(|e| ChatError::Auth(format!("sign-up request: {e}")))?;

        read_success_body(response, "sign-up")
            .await
            .map_err(ChatError::Auth)?;
        info!("[Auth] sign-up accepted for {}", email);
        Ok(())
    }

    /// Exchanges credentials for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/token?grant_type=password", self.auth_url);
        debug!("[Auth] sign-in request for {}", email);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ChatError::Auth(format!("sign-in request: {e}")))?;

        let token: TokenResponse = read_success_json(response, "sign-in")
            .await
            .map_err(ChatError::Auth)?;

        info!("[Auth] signed in as {}", token.user.id);
        Ok(Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: if token.user.email.is_empty() {
                email.to_string()
            } else {
                token.user.email
            },
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }

    /// Asks the backend to send a password-reset mail.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let url = format!("{}/recover", self.auth_url);
        debug!("[Auth] password-reset request for {}", email);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(|e| ChatError::Auth(format!("password-reset request: {e}")))?;

        read_success_body(response, "password-reset")
            .await
            .map_err(ChatError::Auth)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_parses_wire_shape() {
        let body = r#"{
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "user-1", "email": "a@b.co", "role": "authenticated" }
        }"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(token.access_token, "jwt-token");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.user.id, "user-1");
    }
}
