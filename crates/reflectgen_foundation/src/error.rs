//! Error types for the reflectgen pipeline.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::diagnostic::{DiagnosticCode, Severity};

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for reflectgen operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches a source location, creating the context if needed.
    #[must_use]
    pub fn at(mut self, path: impl Into<PathBuf>, line: u32) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_source(path).with_line(line));
        self
    }

    /// Creates a translation-unit parse failure.
    #[must_use]
    pub fn parse_failed(path: &Path, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed {
            path: path.to_path_buf(),
            reason: reason.into(),
        })
    }

    /// Creates a tag syntax error.
    #[must_use]
    pub fn tag_syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TagSyntaxError(message.into()))
    }

    /// Creates an invalid specifier error.
    #[must_use]
    pub fn invalid_specifier(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSpecifier(message.into()))
    }

    /// Creates an invalid property accessor count error.
    #[must_use]
    pub fn invalid_property_count(property: impl Into<String>, count: usize) -> Self {
        Self::new(ErrorKind::InvalidPropertyFunctionCount {
            property: property.into(),
            count,
        })
    }

    /// Creates a function name conflict error.
    #[must_use]
    pub fn name_conflict(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::FunctionNameConflict(name.into()))
    }

    /// Creates an RTTI-disabled error for the given owner.
    #[must_use]
    pub fn rtti_disabled(owner: impl Into<String>) -> Self {
        Self::new(ErrorKind::RttiDisabled(owner.into()))
    }

    /// Creates a base-class-without-RTTI error.
    #[must_use]
    pub fn base_class_no_rtti(derived: impl Into<String>, base: impl Into<String>) -> Self {
        Self::new(ErrorKind::BaseClassNoRtti {
            derived: derived.into(),
            base: base.into(),
        })
    }

    /// Creates a missing parent node error.
    #[must_use]
    pub fn no_parent(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoParentNode(name.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns the diagnostic code for this error.
    #[must_use]
    pub fn code(&self) -> DiagnosticCode {
        self.kind.code()
    }

    /// Returns the severity this error is reported with.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The translation unit could not be read or tokenized at all.
    #[error("failed to parse {}: {reason}", path.display())]
    ParseFailed {
        /// The unit that failed.
        path: PathBuf,
        /// Why it failed.
        reason: String,
    },

    /// The front end reported an error-or-worse diagnostic.
    #[error("compile error: {0}")]
    CompileError(String),

    /// The front end reported a warning.
    #[error("compile warning: {0}")]
    CompileWarning(String),

    /// An annotation invocation is malformed.
    #[error("tag syntax error: {0}")]
    TagSyntaxError(String),

    /// A required specifier is missing or has an unrecognized value.
    #[error("invalid specifier: {0}")]
    InvalidSpecifier(String),

    /// A property entry does not hold exactly a getter, or a getter and a setter.
    #[error("property {property} has an invalid accessor set ({count} accessors)")]
    InvalidPropertyFunctionCount {
        /// Qualified property name.
        property: String,
        /// Number of accessors found.
        count: usize,
    },

    /// A plain function and a property accessor share one registered name.
    #[error("function name conflict: {0}")]
    FunctionNameConflict(String),

    /// A member tried to register under a tagged type without the enable switch.
    #[error("RTTI is not enabled for {0}")]
    RttiDisabled(String),

    /// A base class is unknown, not RTTI-enabled, or not declared in the switch.
    #[error("base class {base} of {derived} has not enabled RTTI")]
    BaseClassNoRtti {
        /// The derived class.
        derived: String,
        /// The offending base.
        base: String,
    },

    /// The enclosing scope of a declaration is not in the model.
    #[error("no parent node for {0}")]
    NoParentNode(String),

    /// A class declares constructors but none of them is a default constructor.
    #[error("class {0} has constructors but no default constructor")]
    NoDefaultConstructor(String),

    /// The settings document could not be read.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Maps this kind onto the diagnostic taxonomy.
    #[must_use]
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::ParseFailed { .. } | Self::Io(_) | Self::Settings(_) => {
                DiagnosticCode::ParseFailed
            }
            Self::CompileError(_) => DiagnosticCode::CompileError,
            Self::CompileWarning(_) => DiagnosticCode::CompileWarning,
            Self::TagSyntaxError(_) => DiagnosticCode::TagSyntaxError,
            Self::InvalidSpecifier(_) => DiagnosticCode::InvalidSpecifier,
            Self::InvalidPropertyFunctionCount { .. } => {
                DiagnosticCode::InvalidPropertyFunctionCount
            }
            Self::FunctionNameConflict(_) => DiagnosticCode::FunctionNameConflict,
            Self::RttiDisabled(_) => DiagnosticCode::RttiDisabled,
            Self::BaseClassNoRtti { .. } => DiagnosticCode::BaseClassNoRtti,
            Self::NoParentNode(_) => DiagnosticCode::NoParentNode,
            Self::NoDefaultConstructor(_) => DiagnosticCode::NoDefaultConstructor,
            Self::Internal(_) => DiagnosticCode::Internal,
        }
    }

    /// Returns the severity this kind is reported with.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::CompileWarning(_) => Severity::Warning,
            Self::ParseFailed { .. } | Self::Io(_) | Self::Settings(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file.
    pub source: Option<PathBuf>,
    /// Line number in source.
    pub line: Option<u32>,
    /// Enclosing declarations, innermost last.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line.
    #[must_use]
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Adds a declaration frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {}", source.display())?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
