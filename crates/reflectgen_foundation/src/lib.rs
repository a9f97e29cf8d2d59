//! Errors, diagnostics, and shared value types for reflectgen.
//!
//! This crate provides:
//! - [`Error`] - Rich error type covering the whole diagnostic taxonomy
//! - [`Diagnostic`] / [`Diagnostics`] - Per-run accumulation of problems
//! - [`FileInfo`] - Where a declaration lives
//! - [`Specifier`] - One key/value pair parsed from an annotation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod diagnostic;
pub mod error;
pub mod location;
pub mod specifier;

pub use diagnostic::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use location::FileInfo;
pub use specifier::{Specifier, strip_quotes};
