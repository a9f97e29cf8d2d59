//! Diagnostics accumulated over one generation run.
//!
//! Declarations are independent units of work, so model-construction failures
//! are recorded here instead of aborting the enclosing file.

use std::fmt;
use std::path::PathBuf;

use crate::error::Error;

/// How bad a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Recorded, processing continues.
    Warning,
    /// The offending declaration (or unit) is dropped.
    Error,
    /// The unit could not be processed at all.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        })
    }
}

/// The diagnostic taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    /// The unit could not be read or parsed.
    ParseFailed,
    /// Front-end error or fatal diagnostic.
    CompileError,
    /// Front-end warning.
    CompileWarning,
    /// Malformed annotation.
    TagSyntaxError,
    /// Missing or unrecognized specifier.
    InvalidSpecifier,
    /// Property entry with a bad accessor set.
    InvalidPropertyFunctionCount,
    /// Property/plain-function clash under one name.
    FunctionNameConflict,
    /// Tagged member of a type without the enable switch.
    RttiDisabled,
    /// Base class not RTTI-enabled.
    BaseClassNoRtti,
    /// Enclosing scope missing from the model.
    NoParentNode,
    /// Constructors declared without a default one.
    NoDefaultConstructor,
    /// Bug in reflectgen itself.
    Internal,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One recorded problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Taxonomy code.
    pub code: DiagnosticCode,
    /// Severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// File the problem was found in.
    pub path: Option<PathBuf>,
    /// 1-based line.
    pub line: Option<u32>,
}

impl Diagnostic {
    /// Creates a diagnostic without a location.
    #[must_use]
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            path: None,
            line: None,
        }
    }

    /// Sets the location.
    #[must_use]
    pub fn at(mut self, path: impl Into<PathBuf>, line: u32) -> Self {
        self.path = Some(path.into());
        self.line = Some(line);
        self
    }

    /// Returns true for error-or-worse diagnostics.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let mut diagnostic = Self::new(err.code(), err.severity(), err.kind.to_string());
        if let Some(ctx) = &err.context {
            diagnostic.path.clone_from(&ctx.source);
            diagnostic.line = ctx.line;
            if let Some(frame) = ctx.stack.last() {
                diagnostic.message = format!("{} (in {frame})", diagnostic.message);
            }
        }
        diagnostic
    }
}

impl From<Error> for Diagnostic {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}", path.display())?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)
    }
}

/// Ordered accumulator of diagnostics.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Records an error as a diagnostic.
    pub fn record(&mut self, err: &Error) {
        self.items.push(Diagnostic::from(err));
    }

    /// Returns all diagnostics in recording order.
    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Iterates over recorded diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of recorded diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of error-or-worse diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    /// Number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Returns true if any error-or-worse diagnostic was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Returns the diagnostics carrying the given code.
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.code == code)
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorContext;

    #[test]
    fn counts_by_severity() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(
            DiagnosticCode::CompileWarning,
            Severity::Warning,
            "unused",
        ));
        diags.record(&Error::rtti_disabled("A"));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
    }

    #[test]
    fn warnings_alone_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(
            DiagnosticCode::CompileWarning,
            Severity::Warning,
            "w",
        ));
        assert!(!diags.has_errors());
    }

    #[test]
    fn from_error_keeps_location() {
        let err = Error::no_parent("Inner").with_context(
            ErrorContext::new()
                .with_source("a.h")
                .with_line(7)
                .with_frame("class Outer"),
        );
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.code, DiagnosticCode::NoParentNode);
        assert_eq!(diag.line, Some(7));
        assert!(diag.message.contains("Outer"));
        assert_eq!(format!("{diag}").split(':').next(), Some("a.h"));
    }

    #[test]
    fn with_code_filters() {
        let mut diags = Diagnostics::new();
        diags.record(&Error::name_conflict("f"));
        diags.record(&Error::rtti_disabled("A"));
        assert_eq!(diags.with_code(DiagnosticCode::RttiDisabled).count(), 1);
    }
}
