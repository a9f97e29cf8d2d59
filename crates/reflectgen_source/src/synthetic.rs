//! In-memory declaration source.
//!
//! Lets callers hand the builder declarations and annotations directly,
//! without going through files. Mostly used by tests.

use std::path::{Path, PathBuf};

use reflectgen_foundation::Severity;

use crate::decl::{Decl, DeclarationSource, FrontendDiagnostic, MacroInvocation};
use crate::lexer::Lexer;
use crate::parser::{ParsedFile, annotation_tokens};

/// A declaration source assembled by hand.
#[derive(Clone, Debug, Default)]
pub struct SyntheticSource {
    path: PathBuf,
    declarations: Vec<Decl>,
    annotations: Vec<MacroInvocation>,
    diagnostics: Vec<FrontendDiagnostic>,
}

impl SyntheticSource {
    /// Creates an empty source for the unit at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Wraps a parsed file as the unit at `path`.
    #[must_use]
    pub fn from_parsed(path: impl Into<PathBuf>, parsed: ParsedFile) -> Self {
        Self {
            path: path.into(),
            declarations: parsed.declarations,
            annotations: parsed.annotations,
            diagnostics: parsed.diagnostics,
        }
    }

    /// Adds a top-level declaration.
    #[must_use]
    pub fn with_decl(mut self, decl: Decl) -> Self {
        self.declarations.push(decl);
        self
    }

    /// Adds an annotation by lexing `text`, e.g. `TPROPERTY(RTTRFuncName="x")`.
    #[must_use]
    pub fn with_annotation(mut self, path: impl AsRef<Path>, line: u32, text: &str) -> Self {
        let tokens = Lexer::tokenize_all(text);
        let name = tokens
            .first()
            .and_then(|t| t.ident())
            .unwrap_or_default()
            .to_string();
        self.annotations.push(MacroInvocation {
            name,
            path: path.as_ref().to_path_buf(),
            line,
            tokens: annotation_tokens(&tokens),
        });
        self
    }

    /// Adds a front-end diagnostic.
    #[must_use]
    pub fn with_diagnostic(mut self, severity: Severity, message: &str, line: u32) -> Self {
        let diagnostic = FrontendDiagnostic::new(severity, message, &self.path, line);
        self.diagnostics.push(diagnostic);
        self
    }
}

impl DeclarationSource for SyntheticSource {
    fn unit_path(&self) -> &Path {
        &self.path
    }

    fn diagnostics(&self) -> &[FrontendDiagnostic] {
        &self.diagnostics
    }

    fn annotations(&self) -> &[MacroInvocation] {
        &self.annotations
    }

    fn declarations(&self) -> &[Decl] {
        &self.declarations
    }
}
