//! Temporary Canvas API token lifecycle
//!
//! The admin credential is only ever used to mint and revoke a short-lived
//! token; everything downstream authenticates with the temporary token. Even
//! if the run dies before cleanup, the token self-expires within the hour.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::info;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::canvas::CanvasClient;
use crate::errors::CredentialError;

/// Lifetime of the minted token. Bounds the blast radius of a leaked token
/// even when revocation fails.
const TOKEN_TTL_HOURS: i64 = 1;

/// Purpose string attached to the minted token, visible in the Canvas UI
const TOKEN_PURPOSE: &str = "Temporary attendance report token";

/// A short-lived Canvas access token, scoped to one run.
///
/// The secret value is kept private and redacted from `Debug` output so it
/// cannot leak through logs.
#[derive(Clone)]
pub struct TemporaryToken {
    id: u64,
    value: String,
    expires_at: DateTime<Utc>,
}

impl TemporaryToken {
    #[must_use]
    pub fn new(id: u64, value: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id,
            value,
            expires_at,
        }
    }

    /// Canvas id of the token, used for revocation
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The secret token value. Never log this.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for TemporaryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryToken")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Mints and revokes the short-lived credential a run operates under
#[async_trait]
pub trait CredentialProvisioner {
    /// Mint a token with a fixed short TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The admin credential is rejected (HTTP 401)
    /// - The configured user id does not exist (HTTP 404)
    /// - Canvas returns any other non-success status
    /// - The response cannot be parsed or lacks the token value
    /// - The request fails at the network level
    async fn create_token(&self) -> Result<TemporaryToken, CredentialError>;

    /// Revoke a minted token before its natural expiry. Best-effort: callers
    /// log failures but never escalate them, since the TTL is the backstop.
    ///
    /// # Errors
    ///
    /// Returns an error if Canvas rejects the deletion or the request fails
    /// at the network level.
    async fn revoke_token(&self, token: &TemporaryToken) -> Result<(), CredentialError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    id: Option<u64>,
    visible_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl CredentialProvisioner for CanvasClient {
    async fn create_token(&self) -> Result<TemporaryToken, CredentialError> {
        info!("Creating temporary API token...");

        let url = format!("{}/users/{}/tokens", self.base_url, self.user_id);
        let expires_at = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
        let payload = serde_json::json!({
            "token": {
                "purpose": TOKEN_PURPOSE,
                "expires_at": expires_at.to_rfc3339(),
            }
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.admin_token)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body: TokenResponse = response.json().await?;
                let id = body
                    .id
                    .ok_or(CredentialError::MissingField { field: "id" })?;
                let value = body.visible_token.ok_or(CredentialError::MissingField {
                    field: "visible_token",
                })?;
                let expires_at = body.expires_at.unwrap_or(expires_at);
                info!("Temporary token created (expires at {expires_at})");
                Ok(TemporaryToken::new(id, value, expires_at))
            }
            StatusCode::UNAUTHORIZED => Err(CredentialError::AdminRejected),
            StatusCode::NOT_FOUND => Err(CredentialError::UnknownUser {
                user_id: self.user_id.clone(),
            }),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(CredentialError::UnexpectedStatus { status, body })
            }
        }
    }

    async fn revoke_token(&self, token: &TemporaryToken) -> Result<(), CredentialError> {
        info!("Cleaning up temporary token...");

        let url = format!("{}/users/{}/tokens/{}", self.base_url, self.user_id, token.id());
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.admin_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Temporary token deleted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(CredentialError::UnexpectedStatus { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CanvasSettings;

    #[tokio::test]
    async fn unreachable_base_url_surfaces_the_network_failure() {
        // Bind then drop to find a local port with nothing listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let settings = CanvasSettings {
            base_url: format!("http://{addr}/api/v1"),
            user_id: "12345".to_string(),
            ..CanvasSettings::default()
        };
        let client = CanvasClient::new(&settings, "1~admin".to_string()).unwrap();

        let err = client.create_token().await.unwrap_err();
        assert!(matches!(err, CredentialError::Network(_)));
        assert!(err.to_string().contains("network error"));
    }

    #[test]
    fn debug_output_redacts_the_token_value() {
        let token = TemporaryToken::new(42, "1~supersecret".to_string(), Utc::now());
        let rendered = format!("{token:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("42"));
    }

    #[test]
    fn token_response_parses_a_canvas_payload() {
        let body = r#"{
            "id": 7,
            "visible_token": "1~abcdef",
            "expires_at": "2024-12-16T09:00:00Z",
            "purpose": "Temporary attendance report token"
        }"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.id, Some(7));
        assert_eq!(parsed.visible_token.as_deref(), Some("1~abcdef"));
        assert!(parsed.expires_at.is_some());
    }

    #[test]
    fn token_response_tolerates_missing_fields() {
        let parsed: TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.id.is_none());
        assert!(parsed.visible_token.is_none());
    }
}
