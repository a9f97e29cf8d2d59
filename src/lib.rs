//! reflectgen - C++ reflection metadata extractor and RTTR code generator
//!
//! This crate re-exports all layers of the reflectgen pipeline for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: reflectgen_runtime    - Settings, build control, driver, CLI
//! Layer 3: reflectgen_codegen    - RTTR registration source generation
//! Layer 2: reflectgen_builder    - Tag scanning, tree building, templates
//! Layer 1: reflectgen_model      - Declaration tree and JSON dump
//!          reflectgen_source     - Declaration source and header front end
//! Layer 0: reflectgen_foundation - Errors, diagnostics, specifiers
//! ```

pub use reflectgen_builder as builder;
pub use reflectgen_codegen as codegen;
pub use reflectgen_foundation as foundation;
pub use reflectgen_model as model;
pub use reflectgen_runtime as runtime;
pub use reflectgen_source as source;
