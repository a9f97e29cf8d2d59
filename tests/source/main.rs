//! Integration tests for Layer 1: Declaration source
//!
//! Tests for the header front end, its crash resistance and
//! translation-unit loading.

mod loading;
mod parsing;
mod robustness;
