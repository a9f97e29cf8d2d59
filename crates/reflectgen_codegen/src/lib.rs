//! RTTR registration source generation for reflectgen.
//!
//! This crate provides:
//! - [`generate_node`] / [`Emitter`] - Registration statements per node kind
//! - [`render_file`] - One `RTTR_REGISTRATION` translation unit per source file
//! - [`write_outputs`] - Writes every rendered file into the output directory
//! - [`GeneratorConfig`] - Reserved specifier prefix, include roots, banner and
//!   smart-pointer wrapper

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod emit;
pub mod render;

pub use config::{GeneratorConfig, OUTPUT_SUFFIX, SmartPointer, output_file_name};
pub use emit::{Emitter, generate_node};
pub use render::{GenerationReport, RenderedFile, render_file, write_outputs};
