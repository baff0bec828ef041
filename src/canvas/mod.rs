//! Canvas REST API client
//!
//! ## Module map
//! - `tokens.rs` — mint and revoke the short-lived access token.
//! - `launch.rs` — exchange that token for a sessionless Roll Call launch URL.
//!
//! The request/response shapes here belong to Canvas and may drift between
//! releases; every call therefore checks the HTTP status and the presence of
//! the fields it needs, and maps each failure to a distinct error variant.

pub mod launch;
pub mod tokens;

pub use launch::{LaunchResolver, LaunchUrl};
pub use tokens::{CredentialProvisioner, TemporaryToken};

use std::time::Duration;

use crate::settings::CanvasSettings;

/// Timeout applied to every Canvas API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Canvas endpoints this tool needs: token create/delete and
/// the sessionless launch exchange.
pub struct CanvasClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    account_id: String,
    admin_token: String,
    rollcall_launch_url: String,
}

impl CanvasClient {
    /// Build a client from validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(settings: &CanvasSettings, admin_token: String) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            user_id: settings.user_id.clone(),
            account_id: settings.account_id.clone(),
            admin_token,
            rollcall_launch_url: settings.rollcall_launch_url.clone(),
        })
    }
}
