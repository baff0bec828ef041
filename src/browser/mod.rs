//! Headless browser automation for the Roll Call report form
//!
//! Roll Call provides no report API; the only way to request a report is its
//! web form, so this module drives a headless Chrome session through it.
//!
//! ## Module map
//! - `driver.rs` — WebDriver session setup (capabilities, timeouts).
//! - `form.rs` — the form interaction itself, and the session teardown
//!   guarantee around it.
//!
//! All Roll Call field identifiers live in `form.rs`; when the Roll Call
//! interface drifts, that file is the only place that changes.

pub mod driver;
pub mod form;

pub use form::{ReportSubmitter, WebDriverSubmitter};
