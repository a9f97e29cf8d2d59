//! Translation-unit loading.
//!
//! A unit is a `.cpp` file plus every quoted include it reaches. Each file is
//! parsed once, depth first, with macro definitions flowing through includes
//! in textual order.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use reflectgen_foundation::{Error, Result, Severity};
use tracing::{debug, trace};

use crate::decl::{Decl, DeclarationSource, FrontendDiagnostic, MacroInvocation};
use crate::lexer::Lexer;
use crate::parser::HeaderParser;
use crate::pp::{self, Defines, IncludeDirective};

/// Include search paths and predefined macros for a load.
#[derive(Clone, Debug, Default)]
pub struct LoaderConfig {
    /// Directories searched after the including file's own directory.
    pub include_paths: Vec<PathBuf>,
    /// Predefined macros, name to replacement text.
    pub defines: Vec<(String, String)>,
}

impl LoaderConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include search path.
    #[must_use]
    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    /// Adds a predefined macro.
    #[must_use]
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }
}

/// Everything parsed for one translation unit.
#[derive(Debug, Default)]
pub struct ParsedUnit {
    path: PathBuf,
    files: Vec<PathBuf>,
    declarations: Vec<Decl>,
    annotations: Vec<MacroInvocation>,
    diagnostics: Vec<FrontendDiagnostic>,
}

impl ParsedUnit {
    /// Files that contributed to the unit, in load order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl DeclarationSource for ParsedUnit {
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

/// Loads translation units from disk.
#[derive(Clone, Debug, Default)]
pub struct UnitLoader {
    config: LoaderConfig,
}

impl UnitLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Loads and parses the unit at `path` with its includes.
    ///
    /// # Errors
    ///
    /// Returns a parse failure when the unit itself cannot be read. Problems
    /// inside the unit, including unreadable includes, become diagnostics.
    pub fn load(&self, path: &Path) -> Result<ParsedUnit> {
        let source =
            fs::read_to_string(path).map_err(|e| Error::parse_failed(path, e.to_string()))?;
        let path = normalize(path);
        let mut defines: Defines = self.config.defines.iter().cloned().collect();
        let mut state = LoadState {
            config: &self.config,
            visited: HashSet::from([identity(&path)]),
            unit: ParsedUnit {
                path: path.clone(),
                ..ParsedUnit::default()
            },
        };
        state.parse_file(&path, &source, &mut defines);
        debug!(
            unit = %path.display(),
            files = state.unit.files.len(),
            declarations = state.unit.declarations.len(),
            annotations = state.unit.annotations.len(),
            "loaded translation unit"
        );
        Ok(state.unit)
    }
}

struct LoadState<'a> {
    config: &'a LoaderConfig,
    visited: HashSet<PathBuf>,
    unit: ParsedUnit,
}

impl LoadState<'_> {
    fn parse_file(&mut self, path: &Path, source: &str, defines: &mut Defines) {
        trace!(file = %path.display(), "parsing");
        let tokens = Lexer::tokenize_all(source);
        let pre = pp::preprocess(tokens, defines, &mut |defines, include| {
            self.include(path, defines, include);
        });
        self.unit.diagnostics.extend(
            pre.diagnostics
                .into_iter()
                .map(|d| FrontendDiagnostic::new(d.severity, d.message, path, d.line)),
        );
        let parsed = HeaderParser::new(path, pre.tokens).parse();
        self.unit.declarations.extend(parsed.declarations);
        self.unit.annotations.extend(parsed.annotations);
        self.unit.diagnostics.extend(parsed.diagnostics);
        self.unit.files.push(path.to_path_buf());
    }

    fn include(&mut self, from: &Path, defines: &mut Defines, include: &IncludeDirective) {
        let Some(resolved) = self.resolve(from, &include.target) else {
            self.unit.diagnostics.push(FrontendDiagnostic::new(
                Severity::Warning,
                format!("cannot find include file \"{}\"", include.target),
                from,
                include.line,
            ));
            return;
        };
        if !self.visited.insert(identity(&resolved)) {
            return;
        }
        match fs::read_to_string(&resolved) {
            Ok(source) => self.parse_file(&resolved, &source, defines),
            Err(e) => self.unit.diagnostics.push(FrontendDiagnostic::new(
                Severity::Warning,
                format!("cannot read include file {}: {e}", resolved.display()),
                from,
                include.line,
            )),
        }
    }

    fn resolve(&self, from: &Path, target: &str) -> Option<PathBuf> {
        let local = from.parent().map(|dir| dir.join(target));
        local
            .into_iter()
            .chain(self.config.include_paths.iter().map(|dir| dir.join(target)))
            .map(|candidate| normalize(&candidate))
            .find(|candidate| candidate.is_file())
    }
}

/// Key for the visited set: canonical when the file exists.
fn identity(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Lexically removes `.` and `..` components.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
