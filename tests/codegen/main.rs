//! Integration tests for Layer 3: Code generation
//!
//! Builds headers into the declaration tree and renders registration files.

mod registration;
