//! Integration tests for Layer 4: Runtime
//!
//! End-to-end runs over temporary projects.

mod projects;
mod settings;
