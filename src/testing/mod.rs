//! Testing utilities
//!
//! This module provides recording fakes for the orchestrator's seams so the
//! credential-cleanup contract can be tested without Canvas or a browser.
//! It is compiled only for tests and the `testing` feature.

pub mod fakes;

pub use fakes::{FakeResolver, FakeSubmitter, RecordingProvisioner, SubmitBehavior};

use crate::settings::ExportSettings;

/// Settings that pass validation, for orchestrator tests
#[must_use]
pub fn test_settings() -> ExportSettings {
    let mut settings = ExportSettings::default();
    settings.canvas.base_url = "https://school.instructure.com/api/v1".to_string();
    settings.canvas.user_id = "12345".to_string();
    settings.canvas.admin_token = Some("test-admin-token".to_string());
    settings.canvas.admin_token_env = None;
    settings.report.recipient_emails = vec!["registrar@school.edu".to_string()];
    settings
}
