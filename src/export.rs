//! Run orchestration
//!
//! Sequences the stages of one export run and enforces the cleanup
//! contract: once a token has been minted, revocation is attempted exactly
//! once, no matter how the later stages end. A revocation failure is
//! recorded in the outcome but never overrides an earlier fatal error -
//! the token's one-hour TTL is the backstop.

use chrono::NaiveDate;
use log::{info, warn};

use crate::browser::ReportSubmitter;
use crate::canvas::{CredentialProvisioner, LaunchResolver};
use crate::errors::ExportError;
use crate::report::{compute_range, DateRange};
use crate::settings::ExportSettings;

/// Terminal state of one export run
#[derive(Debug)]
pub enum RunOutcome {
    /// The form was submitted. `revoked: false` means the report request
    /// went out but token cleanup is uncertain (it will still self-expire).
    Submitted { revoked: bool },
    /// Nothing was sent. Carries the first fatal error; `revoked` is `None`
    /// when the run failed before a token was ever minted.
    Failed {
        error: ExportError,
        revoked: Option<bool>,
    },
}

impl RunOutcome {
    /// Whether the report request reached Roll Call
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }
}

/// Execute one full export run for the given calendar date.
///
/// Stage order: compute date range, mint token, resolve launch URL, submit
/// the form, revoke the token. A mint failure aborts before any resolver or
/// browser activity; every later failure still goes through revocation.
pub async fn run<P, R, S>(
    provisioner: &P,
    resolver: &R,
    submitter: &S,
    settings: &ExportSettings,
    today: NaiveDate,
) -> RunOutcome
where
    P: CredentialProvisioner + Sync,
    R: LaunchResolver + Sync,
    S: ReportSubmitter + Sync,
{
    let range = compute_range(today);
    log_range(today, &range);

    let token = match provisioner.create_token().await {
        Ok(token) => token,
        Err(error) => {
            // No token minted: nothing to clean up, nothing else to try
            return RunOutcome::Failed {
                error: error.into(),
                revoked: None,
            };
        }
    };

    let submission = match resolver.sessionless_launch_url(&token).await {
        Ok(launch_url) => submitter
            .submit_report_request(&launch_url, &range, &settings.report.recipient_emails)
            .await
            .map_err(ExportError::from),
        Err(error) => Err(error.into()),
    };

    // Unconditional cleanup: runs whether or not the browser stage succeeded
    let revoked = match provisioner.revoke_token(&token).await {
        Ok(()) => true,
        Err(error) => {
            warn!("Could not revoke temporary token (it self-expires within the hour): {error}");
            false
        }
    };

    match submission {
        Ok(()) => RunOutcome::Submitted { revoked },
        Err(error) => RunOutcome::Failed {
            error,
            revoked: Some(revoked),
        },
    }
}

fn log_range(today: NaiveDate, range: &DateRange) {
    info!(
        "Today is {}. Report date range: {} to {}",
        today.format("%A"),
        range.form_start(),
        range.form_end()
    );
}
