//! Sessionless launch URL exchange
//!
//! A sessionless launch URL grants access to the Roll Call LTI tool without
//! an interactive Canvas login, which is what makes scheduled headless runs
//! possible. The URL embeds session authority: it is single-use, time-boxed,
//! and treated as a secret for the rest of the run.

use std::fmt;

use async_trait::async_trait;
use log::info;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::canvas::{CanvasClient, TemporaryToken};
use crate::errors::ResolutionError;

/// A single-use, pre-authenticated launch URL into Roll Call.
///
/// Redacted from `Debug` output; must never be logged or persisted.
#[derive(Clone)]
pub struct LaunchUrl(String);

impl LaunchUrl {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self(url)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LaunchUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LaunchUrl(<redacted>)")
    }
}

/// Exchanges the temporary credential for a pre-authenticated launch URL
#[async_trait]
pub trait LaunchResolver {
    /// Resolve the sessionless launch URL for the configured account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The temporary token is rejected (HTTP 401)
    /// - The account is unknown or the tool is not enabled for it (HTTP 404)
    /// - Canvas returns any other non-success status
    /// - The response lacks the `url` field
    /// - The request fails at the network level
    async fn sessionless_launch_url(
        &self,
        token: &TemporaryToken,
    ) -> Result<LaunchUrl, ResolutionError>;
}

#[derive(Deserialize)]
struct LaunchResponse {
    url: Option<String>,
}

#[async_trait]
impl LaunchResolver for CanvasClient {
    async fn sessionless_launch_url(
        &self,
        token: &TemporaryToken,
    ) -> Result<LaunchUrl, ResolutionError> {
        info!("Generating Roll Call sessionless launch URL...");

        let api_url = format!(
            "{}/accounts/{}/external_tools/sessionless_launch",
            self.base_url, self.account_id
        );

        // Authenticated with the temporary token, not the admin credential
        let response = self
            .http
            .get(&api_url)
            .query(&[("url", self.rollcall_launch_url.as_str())])
            .bearer_auth(token.value())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: LaunchResponse = response.json().await?;
                let url = body.url.ok_or(ResolutionError::MissingUrl)?;
                info!("Sessionless launch URL retrieved");
                Ok(LaunchUrl::new(url))
            }
            StatusCode::UNAUTHORIZED => Err(ResolutionError::CredentialRejected),
            StatusCode::NOT_FOUND => Err(ResolutionError::ToolUnavailable {
                account_id: self.account_id.clone(),
            }),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ResolutionError::UnexpectedStatus { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_exposes_the_url() {
        let url = LaunchUrl::new("https://rollcall.instructure.com/launch?token=abc".to_string());
        let rendered = format!("{url:?}");
        assert_eq!(rendered, "LaunchUrl(<redacted>)");
        assert!(!rendered.contains("token=abc"));
    }

    #[test]
    fn launch_response_parses_with_and_without_url() {
        let with: LaunchResponse =
            serde_json::from_str(r#"{"id": 1, "url": "https://example.com/x"}"#).unwrap();
        assert_eq!(with.url.as_deref(), Some("https://example.com/x"));

        let without: LaunchResponse = serde_json::from_str("{}").unwrap();
        assert!(without.url.is_none());
    }
}
