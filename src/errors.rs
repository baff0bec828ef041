//! Error taxonomy for the export run
//!
//! Each stage of the run has its own error enum so the orchestrator can
//! branch on failure kind, and each variant carries enough detail for an
//! operator to tell "my credentials are wrong" from "the Roll Call form
//! changed" from "transient network/timeout".

use std::time::Duration;

use reqwest::StatusCode;
use thirtyfour::prelude::WebDriverError;
use thiserror::Error;

/// Failures minting or revoking the temporary Canvas API token
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("admin credential rejected by Canvas (HTTP 401) - check admin_token")]
    AdminRejected,

    #[error("no Canvas user with id {user_id} (HTTP 404) - check user_id")]
    UnknownUser { user_id: String },

    #[error("Canvas token endpoint returned HTTP {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Canvas token response was missing the `{field}` field")]
    MissingField { field: &'static str },

    #[error("network error talking to Canvas: {0}")]
    Network(#[from] reqwest::Error),
}

/// Failures exchanging the temporary token for a sessionless launch URL
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("temporary token rejected during launch URL exchange (HTTP 401)")]
    CredentialRejected,

    #[error("account {account_id} not found or Roll Call tool not enabled for it (HTTP 404)")]
    ToolUnavailable { account_id: String },

    #[error("sessionless launch endpoint returned HTTP {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("sessionless launch response was missing the `url` field")]
    MissingUrl,

    #[error("network error talking to Canvas: {0}")]
    Network(#[from] reqwest::Error),
}

/// Failures driving the browser through the Roll Call report form
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("could not start a WebDriver session at {webdriver_url}: {source}")]
    DriverInit {
        webdriver_url: String,
        #[source]
        source: WebDriverError,
    },

    #[error("navigation to the Roll Call launch URL failed: {0}")]
    Navigation(#[source] WebDriverError),

    #[error("timed out after {waited:?} waiting for the Roll Call report form to appear")]
    TimedOutAwaitingForm { waited: Duration },

    #[error("report form field `{field}` not found - the Roll Call interface may have changed")]
    FormLayoutChanged { field: &'static str },

    #[error("WebDriver error during form interaction: {0}")]
    Interaction(#[source] WebDriverError),
}

/// Configuration problems detected before any network or browser activity
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: basic_toml::Error,
    },

    #[error("missing required setting `{0}` - see Settings.toml.example")]
    Missing(&'static str),

    #[error("invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for a run, tagged by the stage that produced it
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("credential provisioning failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("launch URL resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("report form submission failed: {0}")]
    Submission(#[from] SubmissionError),
}

impl ExportError {
    /// Name of the stage that produced this error, for operator-facing logs
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Settings(_) => "configuration",
            Self::Credential(_) => "credential provisioning",
            Self::Resolution(_) => "launch URL resolution",
            Self::Submission(_) => "form submission",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_are_distinguishable() {
        let rejected = CredentialError::AdminRejected.to_string();
        let unknown = CredentialError::UnknownUser {
            user_id: "12345".to_string(),
        }
        .to_string();

        assert!(rejected.contains("admin_token"));
        assert!(unknown.contains("12345"));
        assert!(unknown.contains("user_id"));
        assert_ne!(rejected, unknown);
    }

    #[test]
    fn submission_errors_name_the_failure_mode() {
        let timeout = SubmissionError::TimedOutAwaitingForm {
            waited: Duration::from_secs(10),
        }
        .to_string();
        let drift = SubmissionError::FormLayoutChanged {
            field: "report[email]",
        }
        .to_string();

        assert!(timeout.contains("timed out"));
        assert!(drift.contains("report[email]"));
        assert!(drift.contains("interface may have changed"));
    }

    #[test]
    fn export_error_reports_its_stage() {
        let err = ExportError::from(ResolutionError::MissingUrl);
        assert_eq!(err.stage(), "launch URL resolution");
        assert!(err.to_string().contains("launch URL resolution failed"));

        let err = ExportError::from(CredentialError::AdminRejected);
        assert_eq!(err.stage(), "credential provisioning");
    }

    #[test]
    fn configuration_failures_carry_the_configuration_stage() {
        let err = ExportError::from(SettingsError::Missing("canvas.base_url"));
        assert_eq!(err.stage(), "configuration");

        let rendered = err.to_string();
        assert!(rendered.contains("configuration error"));
        assert!(rendered.contains("canvas.base_url"));
    }
}
