//! Recording fake implementations of the orchestrator's seams

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::browser::ReportSubmitter;
use crate::canvas::{CredentialProvisioner, LaunchResolver, LaunchUrl, TemporaryToken};
use crate::errors::{CredentialError, ResolutionError, SubmissionError};
use crate::report::DateRange;

/// Counts mint/revoke calls; optionally fails either operation
#[derive(Default)]
pub struct RecordingProvisioner {
    pub create_calls: AtomicUsize,
    pub revoke_calls: AtomicUsize,
    fail_create: bool,
    fail_revoke: bool,
}

impl RecordingProvisioner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_revoke() -> Self {
        Self {
            fail_revoke: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CredentialProvisioner for RecordingProvisioner {
    async fn create_token(&self) -> Result<TemporaryToken, CredentialError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(CredentialError::AdminRejected);
        }
        Ok(TemporaryToken::new(
            1,
            "1~fake-token".to_string(),
            Utc::now() + chrono::Duration::hours(1),
        ))
    }

    async fn revoke_token(&self, _token: &TemporaryToken) -> Result<(), CredentialError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_revoke {
            return Err(CredentialError::UnexpectedStatus {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "simulated revoke failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Counts launch URL exchanges; optionally fails them
#[derive(Default)]
pub struct FakeResolver {
    pub calls: AtomicUsize,
    fail: bool,
}

impl FakeResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LaunchResolver for FakeResolver {
    async fn sessionless_launch_url(
        &self,
        _token: &TemporaryToken,
    ) -> Result<LaunchUrl, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ResolutionError::ToolUnavailable {
                account_id: "1".to_string(),
            });
        }
        Ok(LaunchUrl::new(
            "https://rollcall.example.test/launch?verifier=fake".to_string(),
        ))
    }
}

/// How a `FakeSubmitter` should end its simulated browser stage
#[derive(Clone, Copy, Debug)]
pub enum SubmitBehavior {
    Succeed,
    TimeOutAwaitingForm,
    LayoutDrift,
}

/// Counts submission attempts and ends them per the configured behavior
pub struct FakeSubmitter {
    pub calls: AtomicUsize,
    behavior: SubmitBehavior,
}

impl FakeSubmitter {
    #[must_use]
    pub fn new(behavior: SubmitBehavior) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            behavior,
        }
    }
}

#[async_trait]
impl ReportSubmitter for FakeSubmitter {
    async fn submit_report_request(
        &self,
        _launch_url: &LaunchUrl,
        _range: &DateRange,
        _recipients: &[String],
    ) -> Result<(), SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SubmitBehavior::Succeed => Ok(()),
            SubmitBehavior::TimeOutAwaitingForm => Err(SubmissionError::TimedOutAwaitingForm {
                waited: Duration::from_secs(10),
            }),
            SubmitBehavior::LayoutDrift => Err(SubmissionError::FormLayoutChanged {
                field: "report[start_date]",
            }),
        }
    }
}
