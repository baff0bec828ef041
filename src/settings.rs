//! Application settings
//!
//! All configuration is collected into one immutable `ExportSettings` value
//! at process start and passed into each component; nothing reads ambient
//! globals afterwards. Settings are loaded with the following priority
//! (highest to lowest):
//! 1. Environment variables
//! 2. Settings.toml in the current directory (if it exists)
//! 3. Default settings

use std::fs;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::SettingsError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportSettings {
    pub canvas: CanvasSettings,
    pub report: ReportSettings,
    pub browser: BrowserSettings,
    pub logging: LoggingSettings,
}

/// Canvas REST API coordinates and the admin credential used to mint
/// short-lived tokens. The admin token is never used for the form
/// submission itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Canvas API base URL, e.g. `https://school.instructure.com/api/v1`
    pub base_url: String,
    /// Canvas user id of the account that owns the admin token
    pub user_id: String,
    /// Canvas account id under which the Roll Call tool is installed
    pub account_id: String,

    // Direct value (can be overridden by an environment variable)
    pub admin_token: Option<String>,
    // Environment variable name for the override
    pub admin_token_env: Option<String>,

    /// Launch URL of the Roll Call LTI tool
    pub rollcall_launch_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportSettings {
    /// Address(es) Roll Call emails the report download link to
    pub recipient_emails: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// WebDriver endpoint of a running chromedriver
    pub webdriver_url: String,
    /// Seconds to wait for the Roll Call page to load
    pub page_load_timeout_secs: u64,
    /// Seconds to wait for form elements to appear
    pub element_wait_timeout_secs: u64,
    /// Seconds to wait after form submission before tearing down
    pub form_submit_wait_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Write logs to a file instead of stderr (for scheduled-task hosts)
    pub enable_file_logging: bool,
    pub log_file_path: String,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_id: String::new(),
            account_id: "1".to_string(),
            admin_token: None,
            admin_token_env: Some("CANVAS_ADMIN_TOKEN".to_string()),
            rollcall_launch_url: "https://rollcall.instructure.com/launch".to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            page_load_timeout_secs: 30,
            element_wait_timeout_secs: 10,
            form_submit_wait_secs: 5,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_file_logging: false,
            log_file_path: "attendance_export.log".to_string(),
        }
    }
}

impl ExportSettings {
    /// Load settings from Settings.toml and environment variables, then
    /// initialize logging and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - The log file cannot be opened (when file logging is enabled)
    /// - A required setting is missing or invalid
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        init_logging(&settings.logging)?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load base settings from Settings.toml in the current directory,
    /// falling back to defaults when no file is present.
    fn load_base_settings() -> Result<Self, SettingsError> {
        let path = std::path::PathBuf::from("Settings.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        let toml_content = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        basic_toml::from_str(&toml_content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_canvas_env_overrides(&mut settings.canvas);
        Self::apply_report_env_overrides(&mut settings.report);
        Self::apply_browser_env_overrides(&mut settings.browser);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    pub fn apply_canvas_env_overrides(canvas: &mut CanvasSettings) {
        if let Ok(base_url) = std::env::var("CANVAS_BASE_URL") {
            canvas.base_url = base_url;
        }
        if let Ok(user_id) = std::env::var("CANVAS_USER_ID") {
            canvas.user_id = user_id;
        }
        if let Ok(account_id) = std::env::var("CANVAS_ACCOUNT_ID") {
            canvas.account_id = account_id;
        }
        if let Ok(launch_url) = std::env::var("ROLLCALL_LAUNCH_URL") {
            canvas.rollcall_launch_url = launch_url;
        }
    }

    pub fn apply_report_env_overrides(report: &mut ReportSettings) {
        if let Ok(emails) = std::env::var("REPORT_EMAILS") {
            report.recipient_emails = emails
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    pub fn apply_browser_env_overrides(browser: &mut BrowserSettings) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            browser.webdriver_url = webdriver_url;
        }
        Self::apply_numeric_env_override("PAGE_LOAD_TIMEOUT", &mut browser.page_load_timeout_secs);
        Self::apply_numeric_env_override(
            "ELEMENT_WAIT_TIMEOUT",
            &mut browser.element_wait_timeout_secs,
        );
        Self::apply_numeric_env_override("FORM_SUBMIT_WAIT", &mut browser.form_submit_wait_secs);
    }

    fn apply_logging_env_overrides(logging: &mut LoggingSettings) {
        if let Ok(level) = std::env::var("RUST_LOG") {
            logging.level = level;
        }
        if let Ok(enabled) = std::env::var("ENABLE_FILE_LOGGING") {
            if let Ok(enabled) = enabled.parse::<bool>() {
                logging.enable_file_logging = enabled;
            }
        }
        if let Ok(path) = std::env::var("LOG_FILE_PATH") {
            logging.log_file_path = path;
        }
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Reject incomplete or placeholder configuration before any network or
    /// browser activity happens.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or invalid setting.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.canvas.base_url.is_empty() {
            return Err(SettingsError::Missing("canvas.base_url"));
        }
        if Url::parse(&self.canvas.base_url).is_err() {
            return Err(SettingsError::Invalid {
                name: "canvas.base_url",
                reason: format!("`{}` is not a valid URL", self.canvas.base_url),
            });
        }
        if self.canvas.base_url.contains("yourschool") {
            return Err(SettingsError::Invalid {
                name: "canvas.base_url",
                reason: "placeholder value - set your institution's Canvas URL".to_string(),
            });
        }
        if self.canvas.user_id.is_empty() {
            return Err(SettingsError::Missing("canvas.user_id"));
        }
        if self.canvas.account_id.is_empty() {
            return Err(SettingsError::Missing("canvas.account_id"));
        }
        match self.canvas.admin_token() {
            Some(token) if !token.is_empty() => {}
            _ => return Err(SettingsError::Missing("canvas.admin_token")),
        }
        if self.report.recipient_emails.is_empty() {
            return Err(SettingsError::Missing("report.recipient_emails"));
        }
        Ok(())
    }
}

/// Initialize the logger from the logging settings.
///
/// When file logging is enabled the output is piped to `log_file_path`
/// instead of stderr, which suits scheduled-task hosts with no console.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
fn init_logging(logging: &LoggingSettings) -> Result<(), SettingsError> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&logging.level);

    if logging.enable_file_logging {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.log_file_path)
            .map_err(|source| SettingsError::LogFile {
                path: logging.log_file_path.clone(),
                source,
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // A second init attempt (tests load settings repeatedly) is harmless
    let _ = builder.try_init();
    Ok(())
}

impl CanvasSettings {
    /// Get the admin token, checking the environment variable first, then
    /// falling back to the direct value.
    #[must_use]
    pub fn admin_token(&self) -> Option<String> {
        if let Some(env_var) = &self.admin_token_env {
            if let Ok(value) = std::env::var(env_var) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        self.admin_token.clone()
    }
}
