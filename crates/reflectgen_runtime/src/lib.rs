//! Settings, incremental build control and the run driver for reflectgen.
//!
//! This crate provides:
//! - [`Settings`] - The `ReflectionSettings.json` document
//! - [`BuildController`] - Staleness checks and the output directory lifecycle
//! - [`Preprocessor`] - One end-to-end run over a project
//! - [`init_logging`] - `tracing` subscriber setup for the binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod controller;
pub mod driver;
pub mod logging;
pub mod settings;

pub use controller::{BuildController, UNIT_EXTENSIONS};
pub use driver::{Preprocessor, RunOptions, RunSummary};
pub use logging::{LOG_ENV, init_logging};
pub use settings::{SETTINGS_FILE_NAME, Settings, SmartPointerSettings};
