#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the rollcall-export application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod browser;
pub mod canvas;
pub mod errors;
pub mod export;
pub mod report;
pub mod settings;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use canvas::CanvasClient;
pub use errors::ExportError;
pub use export::{run, RunOutcome};
pub use settings::ExportSettings;
