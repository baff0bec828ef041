//! WebDriver session setup

use std::time::Duration;

use log::info;
use thirtyfour::{prelude::WebDriverError, DesiredCapabilities, WebDriver};

use crate::errors::SubmissionError;
use crate::settings::BrowserSettings;

/// Start a headless Chrome session against the configured WebDriver
/// endpoint and apply the page-load timeout.
///
/// # Errors
///
/// Returns `SubmissionError::DriverInit` if the capabilities cannot be
/// built or the session cannot be created; nothing else can have gone
/// wrong yet at this point.
pub async fn start_session(settings: &BrowserSettings) -> Result<WebDriver, SubmissionError> {
    info!("Initializing headless Chrome browser...");

    let init_err = |source: WebDriverError| SubmissionError::DriverInit {
        webdriver_url: settings.webdriver_url.clone(),
        source,
    };

    let mut caps = DesiredCapabilities::chrome();
    caps.set_headless().map_err(init_err)?;
    // Required for headless mode on some systems
    caps.add_chrome_arg("--disable-gpu").map_err(init_err)?;
    // Required when running as root (common in container environments)
    caps.add_chrome_arg("--no-sandbox").map_err(init_err)?;
    // Stability in containerized environments
    caps.add_chrome_arg("--disable-dev-shm-usage")
        .map_err(init_err)?;
    // Some sites behave differently on small viewports
    caps.add_chrome_arg("--window-size=1920,1080")
        .map_err(init_err)?;

    let driver = WebDriver::new(&settings.webdriver_url, caps)
        .await
        .map_err(init_err)?;

    driver
        .set_page_load_timeout(Duration::from_secs(settings.page_load_timeout_secs))
        .await
        .map_err(init_err)?;

    info!("Browser session started");
    Ok(driver)
}
