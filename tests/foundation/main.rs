//! Integration tests for Layer 0: Foundation
//!
//! Tests for errors, diagnostics and annotation specifiers.

mod diagnostics;
mod errors;
