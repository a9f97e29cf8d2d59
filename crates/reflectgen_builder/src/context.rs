//! Shared state of one generation run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use reflectgen_foundation::{Diagnostic, Diagnostics, Error, Result};
use reflectgen_model::{DeclTree, NodeId};
use tracing::{error, warn};

use crate::config::BuilderConfig;
use crate::tags::TagTables;
use crate::template::TemplateRegistry;

/// Declaring file to the top-level nodes generated into its output file.
pub type SourceFileMap = BTreeMap<PathBuf, BTreeSet<NodeId>>;

/// Everything the builder accumulates across translation units.
///
/// One context lives for a whole run; every unit is built into the same tree
/// so headers shared between units are reflected once.
#[derive(Debug)]
pub struct BuildContext {
    pub(crate) config: BuilderConfig,
    pub(crate) tree: DeclTree,
    pub(crate) tags: TagTables,
    pub(crate) templates: TemplateRegistry,
    pub(crate) source_files: SourceFileMap,
    pub(crate) diagnostics: Diagnostics,
}

impl BuildContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            tags: TagTables::new(config.tag_window),
            config,
            tree: DeclTree::new(),
            templates: TemplateRegistry::new(),
            source_files: SourceFileMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The declaration tree.
    #[must_use]
    pub fn tree(&self) -> &DeclTree {
        &self.tree
    }

    /// The tag tables.
    #[must_use]
    pub fn tags(&self) -> &TagTables {
        &self.tags
    }

    /// The template registry.
    #[must_use]
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Declaring file to generated nodes.
    #[must_use]
    pub fn source_files(&self) -> &SourceFileMap {
        &self.source_files
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Associates `id` with the file declaring it, unless the file lies
    /// outside the project root.
    pub fn associate(&mut self, path: &Path, id: NodeId) {
        if self.config.is_in_project(path) {
            self.source_files
                .entry(path.to_path_buf())
                .or_default()
                .insert(id);
        }
    }

    /// Removes the subtree at `id` from the tree and the source-file map.
    ///
    /// # Errors
    ///
    /// Fails for the root or a dangling handle.
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        let dead: BTreeSet<NodeId> = self.tree.walk(id).into_iter().collect();
        self.tree.remove_subtree(id)?;
        for ids in self.source_files.values_mut() {
            ids.retain(|n| !dead.contains(n));
        }
        self.source_files.retain(|_, ids| !ids.is_empty());
        self.templates.forget(&dead);
        Ok(())
    }

    /// Records a diagnostic for `err` and logs it. A diagnostic identical to
    /// one already recorded (a shared header seen again) is dropped.
    pub fn report(&mut self, err: &Error) {
        let diagnostic = Diagnostic::from(err);
        if self.diagnostics.iter().any(|d| *d == diagnostic) {
            return;
        }
        let path = diagnostic
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let line = diagnostic.line.unwrap_or_default();
        if diagnostic.is_error() {
            error!(code = %diagnostic.code, path, line, "{}", diagnostic.message);
        } else {
            warn!(code = %diagnostic.code, path, line, "{}", diagnostic.message);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Splits the context into the tree, the source-file map and the
    /// diagnostics.
    #[must_use]
    pub fn into_parts(self) -> (DeclTree, SourceFileMap, Diagnostics) {
        (self.tree, self.source_files, self.diagnostics)
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflectgen_foundation::{DiagnosticCode, Severity};
    use reflectgen_model::{DeclInfo, NodeData, Record};

    #[test]
    fn associate_honors_project_root() {
        let mut ctx = BuildContext::new(BuilderConfig::new().with_project_root("/game"));
        let root = ctx.tree.root();
        let id = ctx
            .tree
            .insert_child(root, "A", NodeData::Class(Record::new(DeclInfo::default())))
            .unwrap();
        ctx.associate(Path::new("/game/a.h"), id);
        ctx.associate(Path::new("/usr/include/b.h"), id);
        assert_eq!(ctx.source_files().len(), 1);
        assert!(ctx.source_files()[Path::new("/game/a.h")].contains(&id));
    }

    #[test]
    fn discard_cleans_source_map() {
        let mut ctx = BuildContext::default();
        let root = ctx.tree.root();
        let id = ctx
            .tree
            .insert_child(root, "A", NodeData::Class(Record::new(DeclInfo::default())))
            .unwrap();
        ctx.associate(Path::new("a.h"), id);
        ctx.discard(id).unwrap();
        assert!(ctx.source_files().is_empty());
        assert!(ctx.tree().is_empty());
    }

    #[test]
    fn report_records_location() {
        let mut ctx = BuildContext::default();
        ctx.report(&Error::no_parent("Inner").at("a.h", 4));
        ctx.report(&Error::new(reflectgen_foundation::ErrorKind::CompileWarning("w".into())));
        let all = ctx.diagnostics().as_slice();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code, DiagnosticCode::NoParentNode);
        assert_eq!(all[0].line, Some(4));
        assert_eq!(all[1].severity, Severity::Warning);
        assert_eq!(ctx.diagnostics().error_count(), 1);

        ctx.report(&Error::no_parent("Inner").at("a.h", 4));
        assert_eq!(ctx.diagnostics().len(), 2);
    }
}
