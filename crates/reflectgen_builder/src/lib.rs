//! Declaration tree construction for reflectgen.
//!
//! This crate provides:
//! - [`scan_tag`] / [`scan_switch`] - Annotation scanners producing specifiers and base lists
//! - [`TagTables`] - Scanned tags indexed by file, kind and line
//! - [`Builder`] - Scope-stack walk turning tagged declarations into tree nodes
//! - [`TemplateRegistry`] - Class and function templates with cached instances
//! - [`BuildContext`] - The tree, source-file map and diagnostics shared by a run

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod annotation;
pub mod builder;
pub mod config;
pub mod context;
pub mod tags;
pub mod template;

pub use annotation::{scan_switch, scan_tag};
pub use builder::{Builder, UnitStatus};
pub use config::{
    AS_CONSTRUCTOR, BuilderConfig, CONSTRUCT_AS_OBJECT, CONSTRUCT_AS_POINTER, DEFAULT_TAG_WINDOW,
    FUNC_NAME, FUNC_TYPE, RESERVED_PREFIX, STD_CONTAINERS, TagNames,
};
pub use context::{BuildContext, SourceFileMap};
pub use tags::{Tag, TagKind, TagTables};
pub use template::{TemplateRegistry, instantiate_class, instantiate_function, substitute};
