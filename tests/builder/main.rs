//! Integration tests for Layer 2: Declaration builder
//!
//! Builds loaded translation units into the declaration tree.

mod projects;
mod templates;
