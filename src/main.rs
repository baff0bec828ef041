#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use std::process::ExitCode;

use chrono::Local;
use log::{error, info, warn};
use rollcall_export::browser::WebDriverSubmitter;
use rollcall_export::errors::SettingsError;
use rollcall_export::{CanvasClient, ExportError, ExportSettings, RunOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from Settings.toml and environment variables.
    // This also loads the .env file and initializes the logger.
    let settings = match ExportSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            let error = ExportError::from(e);
            // The logger may not be up yet; stderr is the reliable channel
            eprintln!("FAILED during {}: {error}", error.stage());
            return ExitCode::FAILURE;
        }
    };

    info!("Canvas Roll Call attendance export v{} - starting", rollcall_export::VERSION);

    // Validation guarantees the token is present
    let Some(admin_token) = settings.canvas.admin_token() else {
        let error = ExportError::from(SettingsError::Missing("canvas.admin_token"));
        error!("FAILED during {}: {error}", error.stage());
        return ExitCode::FAILURE;
    };

    let client = match CanvasClient::new(&settings.canvas, admin_token) {
        Ok(client) => client,
        Err(e) => {
            error!("Could not build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    let submitter = WebDriverSubmitter::new(settings.browser.clone());

    let today = Local::now().date_naive();
    let outcome = rollcall_export::run(&client, &client, &submitter, &settings, today).await;

    match outcome {
        RunOutcome::Submitted { revoked } => {
            if !revoked {
                warn!("Cleanup uncertain: token revocation failed; it expires on its own");
            }
            info!(
                "SUCCESS - attendance report requested; Roll Call will email it to: {}",
                settings.report.recipient_emails.join(", ")
            );
            ExitCode::SUCCESS
        }
        RunOutcome::Failed { error, .. } => {
            error!("FAILED during {}: {error}", error.stage());
            error!("Attendance report was not requested");
            ExitCode::FAILURE
        }
    }
}
