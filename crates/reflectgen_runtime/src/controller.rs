//! Incremental build control: which units to regenerate, and the output
//! directory lifecycle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reflectgen_codegen::{OUTPUT_SUFFIX, output_file_name};
use reflectgen_foundation::Result;
use reflectgen_model::DUMP_FILE_NAME;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extensions of translation units.
pub const UNIT_EXTENSIONS: &[&str] = &["cpp", "cxx"];

/// Decides which translation units are stale.
#[derive(Clone, Debug)]
pub struct BuildController {
    output_dir: PathBuf,
    force_rebuild: bool,
}

impl BuildController {
    /// Creates a controller writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, force_rebuild: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            force_rebuild,
        }
    }

    /// The output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Whether every unit is regenerated.
    #[must_use]
    pub fn force_rebuild(&self) -> bool {
        self.force_rebuild
    }

    /// Makes sure the output directory exists. On a forced rebuild, first
    /// removes the generated files and the tree dump it holds; nothing else in
    /// the directory is touched.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be read or created, or a stale output
    /// cannot be removed.
    pub fn prepare(&self) -> Result<()> {
        if self.force_rebuild && self.output_dir.is_dir() {
            info!(dir = %self.output_dir.display(), "purging generated files");
            for entry in fs::read_dir(&self.output_dir)? {
                let path = entry?.path();
                if path.is_file() && is_output_file(&path) {
                    debug!(file = %path.display(), "removing");
                    fs::remove_file(&path)?;
                }
            }
        }
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Output file corresponding to `unit`.
    #[must_use]
    pub fn output_path(&self, unit: &Path) -> PathBuf {
        self.output_dir.join(output_file_name(unit))
    }

    /// Whether `unit` must be parsed again: on a forced rebuild, when its
    /// output is missing, or when the output is not strictly newer.
    #[must_use]
    pub fn needs_regeneration(&self, unit: &Path) -> bool {
        if self.force_rebuild {
            return true;
        }
        let output = self.output_path(unit);
        let stale = match (modified(unit), modified(&output)) {
            (Some(source), Some(generated)) => generated <= source,
            _ => true,
        };
        debug!(unit = %unit.display(), output = %output.display(), stale, "checked unit");
        stale
    }

    /// Translation units under `root`, sorted, skipping the generated files
    /// of the output directory.
    ///
    /// # Errors
    ///
    /// Fails if the tree cannot be walked.
    pub fn collect_units(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut units = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            let generated = path.starts_with(&self.output_dir) && is_output_file(path);
            if entry.file_type().is_file() && is_unit(path) && !generated {
                units.push(entry.into_path());
            }
        }
        Ok(units)
    }
}

/// Files a run writes into the output directory.
fn is_output_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(OUTPUT_SUFFIX) || n == DUMP_FILE_NAME)
}

fn is_unit(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| UNIT_EXTENSIONS.iter().any(|u| u.eq_ignore_ascii_case(e)))
}

fn modified(path: &Path) -> Option<std::time::SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, at: SystemTime) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(at)
            .unwrap();
    }

    #[test]
    fn collects_units_sorted_outside_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let now = SystemTime::now();
        touch(&root.join("src/b.cpp"), now);
        touch(&root.join("src/a.CXX"), now);
        touch(&root.join("include/a.h"), now);
        touch(&root.join("Generated/a.generated.cpp"), now);

        let controller = BuildController::new(root.join("Generated"), false);
        let units = controller.collect_units(root).unwrap();
        assert_eq!(units, vec![root.join("src/a.CXX"), root.join("src/b.cpp")]);
    }

    #[test]
    fn staleness_follows_mtimes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let out = root.join("Generated");
        let unit = root.join("Actor.cpp");
        let now = SystemTime::now();
        touch(&unit, now);

        let controller = BuildController::new(&out, false);
        assert_eq!(controller.output_path(&unit), out.join("Actor.generated.cpp"));
        assert!(controller.needs_regeneration(&unit), "missing output");

        touch(&out.join("Actor.generated.cpp"), now);
        assert!(controller.needs_regeneration(&unit), "equal mtimes");

        touch(&out.join("Actor.generated.cpp"), now + Duration::from_secs(5));
        assert!(!controller.needs_regeneration(&unit));
        assert!(BuildController::new(&out, true).needs_regeneration(&unit));
    }

    #[test]
    fn forced_prepare_removes_only_generated_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("Generated");
        let now = SystemTime::now();
        touch(&out.join("Old.generated.cpp"), now);
        touch(&out.join("ast.json"), now);
        touch(&out.join("Keep.cpp"), now);
        touch(&out.join("nested/Deep.generated.cpp"), now);

        BuildController::new(&out, false).prepare().unwrap();
        assert!(out.join("Old.generated.cpp").exists());

        BuildController::new(&out, true).prepare().unwrap();
        assert!(out.is_dir());
        assert!(!out.join("Old.generated.cpp").exists());
        assert!(!out.join("ast.json").exists());
        assert!(out.join("Keep.cpp").exists());
        assert!(out.join("nested/Deep.generated.cpp").exists());

        let fresh = dir.path().join("Fresh");
        BuildController::new(&fresh, true).prepare().unwrap();
        assert!(fresh.is_dir());
    }

    #[test]
    fn sources_inside_the_output_directory_are_units() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let now = SystemTime::now();
        touch(&root.join("Source/Actor.cpp"), now);
        touch(&root.join("Source/Actor.generated.cpp"), now);

        let controller = BuildController::new(root.join("Source"), false);
        assert_eq!(
            controller.collect_units(root).unwrap(),
            vec![root.join("Source/Actor.cpp")]
        );
    }
}
