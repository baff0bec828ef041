//! Roll Call report form interaction
//!
//! Fields are located by their stable `name` attributes, never by position,
//! so a layout shuffle upstream cannot silently put dates in the wrong
//! boxes - it fails loudly as `FormLayoutChanged` instead. The browser
//! session is closed on every exit path; a teardown failure is logged but
//! never masks the submission outcome.

use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use thirtyfour::{
    extensions::query::ElementQueryable, prelude::WebDriverError, By, WebDriver, WebElement,
};
use tokio::time::sleep;

use crate::browser::driver;
use crate::canvas::LaunchUrl;
use crate::errors::SubmissionError;
use crate::report::DateRange;
use crate::settings::BrowserSettings;

// Roll Call form field identifiers. The automation's fragile coupling point:
// if Roll Call renames these, this is the file to fix.
const START_DATE_FIELD: &str = "report[start_date]";
const END_DATE_FIELD: &str = "report[end_date]";
const EMAIL_FIELD: &str = "report[email]";
const SUBMIT_BUTTON: &str = "commit";

/// Pause between populating the form and clicking submit. Roll Call has been
/// observed to error on rapid submissions.
const PRE_SUBMIT_SETTLE: Duration = Duration::from_secs(2);

/// Polling interval while waiting for the form to appear
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Submits the report request through the external tool's form
#[async_trait]
pub trait ReportSubmitter {
    /// Navigate to the launch URL, fill the report form and submit it.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser session cannot be started, navigation
    /// fails, the form never appears, a field is missing, or any WebDriver
    /// interaction fails. The session is closed in every case.
    async fn submit_report_request(
        &self,
        launch_url: &LaunchUrl,
        range: &DateRange,
        recipients: &[String],
    ) -> Result<(), SubmissionError>;
}

/// `ReportSubmitter` backed by a real headless Chrome session
pub struct WebDriverSubmitter {
    settings: BrowserSettings,
}

impl WebDriverSubmitter {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ReportSubmitter for WebDriverSubmitter {
    async fn submit_report_request(
        &self,
        launch_url: &LaunchUrl,
        range: &DateRange,
        recipients: &[String],
    ) -> Result<(), SubmissionError> {
        let driver = driver::start_session(&self.settings).await?;

        // Drive the form, then tear the session down no matter how it went.
        // Teardown failure is logged only; the form outcome stands.
        let outcome = drive_form(&driver, launch_url, range, recipients, &self.settings).await;
        if let Err(e) = driver.quit().await {
            warn!("Could not close browser session cleanly: {e}");
        }
        outcome
    }
}

async fn drive_form(
    driver: &WebDriver,
    launch_url: &LaunchUrl,
    range: &DateRange,
    recipients: &[String],
    settings: &BrowserSettings,
) -> Result<(), SubmissionError> {
    info!("Navigating to Roll Call attendance report page...");
    driver
        .goto(launch_url.as_str())
        .await
        .map_err(SubmissionError::Navigation)?;

    // Await ready: the start-date field doubles as the "form is present"
    // marker. Coming up empty within the wait means the page never produced
    // the form; any other fault (dead session, transport error) is not a
    // timeout and must not be reported as one.
    let waited = Duration::from_secs(settings.element_wait_timeout_secs);
    let start_field = driver
        .query(By::Name(START_DATE_FIELD))
        .wait(waited, POLL_INTERVAL)
        .first()
        .await
        .map_err(|e| match e {
            WebDriverError::NoSuchElement(_) => SubmissionError::TimedOutAwaitingForm { waited },
            other => SubmissionError::Interaction(other),
        })?;

    info!(
        "Filling report form: {} to {}",
        range.form_start(),
        range.form_end()
    );
    fill(&start_field, &range.form_start()).await?;

    // The page rendered, so a missing field from here on means the Roll
    // Call interface drifted, not that we were too impatient.
    let end_field = find_form_field(driver, END_DATE_FIELD).await?;
    fill(&end_field, &range.form_end()).await?;

    // The accepted shape for multiple recipients is unverified against the
    // live form; a comma-separated list is what the tool has accepted so far.
    let email_field = find_form_field(driver, EMAIL_FIELD).await?;
    fill(&email_field, &recipients.join(", ")).await?;

    sleep(PRE_SUBMIT_SETTLE).await;

    let submit_button = find_form_field(driver, SUBMIT_BUTTON).await?;
    submit_button
        .click()
        .await
        .map_err(SubmissionError::Interaction)?;
    info!("Form submitted");

    // No programmatic confirmation exists; give the server a moment to
    // acknowledge before the session goes away.
    sleep(Duration::from_secs(settings.form_submit_wait_secs)).await;
    Ok(())
}

/// Locate a form element by its `name` attribute, mapping absence to
/// `FormLayoutChanged` so interface drift is reported distinctly.
async fn find_form_field(
    driver: &WebDriver,
    field: &'static str,
) -> Result<WebElement, SubmissionError> {
    driver.find(By::Name(field)).await.map_err(|e| match e {
        WebDriverError::NoSuchElement(_) => SubmissionError::FormLayoutChanged { field },
        other => SubmissionError::Interaction(other),
    })
}

async fn fill(element: &WebElement, text: &str) -> Result<(), SubmissionError> {
    element.clear().await.map_err(SubmissionError::Interaction)?;
    element
        .send_keys(text)
        .await
        .map_err(SubmissionError::Interaction)
}
