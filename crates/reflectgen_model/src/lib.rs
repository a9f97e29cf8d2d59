//! Declaration node model for reflectgen.
//!
//! This crate provides:
//! - [`DeclTree`] - Arena tree of reflected declarations with [`NodeId`] handles
//! - [`NodeData`] - Closed set of node payloads (records, functions, enums, templates)
//! - [`dump`] - JSON debug dump mirroring the tree

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod dump;
pub mod node;
pub mod tree;

pub use dump::{DUMP_FILE_NAME, dump_json, write_dump};
pub use node::{
    DeclInfo, EnumInfo, FunctionEntry, Node, NodeData, NodeId, Overload, OverloadKind, Param,
    Property, Record, TemplateInfo, TemplateParam, TemplateParamKind,
};
pub use tree::{DeclTree, split_qualified};
