//! Declaration sources for reflectgen.
//!
//! This crate provides:
//! - [`DeclarationSource`] - The interface the builder consumes
//! - [`Lexer`] / [`pp`] / [`HeaderParser`] - A tolerant C++ header front end
//! - [`UnitLoader`] - Loads a translation unit with its includes
//! - [`SyntheticSource`] - Hand-assembled declarations for tests
//! - [`spelling`] - Type spelling helpers shared with the builder

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decl;
pub mod eval;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod pp;
pub mod spelling;
pub mod synthetic;
pub mod token;

pub use decl::{
    Access, AnnotationToken, AnnotationTokenKind, Decl, DeclKind, DeclarationSource,
    FrontendDiagnostic, FunctionDecl, FunctionRole, MacroInvocation, ParamDecl, RecordTag,
    SourceRange, TemplateParamDecl, TemplateParamKind,
};
pub use lexer::Lexer;
pub use loader::{LoaderConfig, ParsedUnit, UnitLoader};
pub use parser::{HeaderParser, ParsedFile, parse_source};
pub use synthetic::SyntheticSource;
pub use token::{Span, Token, TokenKind};
