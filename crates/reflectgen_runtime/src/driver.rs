//! One end-to-end run: settings, parsing, tree building, dump and
//! generation.

use std::path::{Path, PathBuf};

use reflectgen_builder::{BuildContext, Builder, DEFAULT_TAG_WINDOW, UnitStatus};
use reflectgen_codegen::write_outputs;
use reflectgen_foundation::{Diagnostics, Error, ErrorKind, Result};
use reflectgen_model::{DUMP_FILE_NAME, write_dump};
use reflectgen_source::UnitLoader;
use reflectgen_source::loader::normalize;
use tracing::{info, warn};

use crate::controller::BuildController;
use crate::settings::Settings;

/// What to run and how.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Directory scanned for translation units.
    pub project_root: PathBuf,
    /// Settings file, or a directory holding one. Defaults to the project root.
    pub settings: Option<PathBuf>,
    /// Regenerate everything, removing previous outputs first.
    pub rebuild: bool,
    /// Write the tree dump next to the generated files.
    pub dump: bool,
    /// How many lines above a declaration its tag may sit.
    pub tag_window: u32,
    /// Reflect tagged structs without the enable switch.
    pub implicit_struct_rtti: bool,
}

impl RunOptions {
    /// Options for `project_root` with everything else defaulted.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            settings: None,
            rebuild: false,
            dump: true,
            tag_window: DEFAULT_TAG_WINDOW,
            implicit_struct_rtti: false,
        }
    }

    /// Builder method to use a specific settings file.
    #[must_use]
    pub fn with_settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings = Some(path.into());
        self
    }

    /// Builder method to force a full rebuild.
    #[must_use]
    pub fn with_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    /// Builder method to toggle the tree dump.
    #[must_use]
    pub fn with_dump(mut self, dump: bool) -> Self {
        self.dump = dump;
        self
    }

    /// Builder method to set the tag window.
    #[must_use]
    pub fn with_tag_window(mut self, lines: u32) -> Self {
        self.tag_window = lines;
        self
    }

    /// Builder method to reflect tagged structs without the switch.
    #[must_use]
    pub fn with_implicit_struct_rtti(mut self, enabled: bool) -> Self {
        self.implicit_struct_rtti = enabled;
        self
    }
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Translation units found.
    pub units_scanned: usize,
    /// Units whose output was already up to date.
    pub units_skipped: usize,
    /// Units the front end rejected.
    pub units_aborted: usize,
    /// Registration files written.
    pub files_written: Vec<PathBuf>,
    /// Error diagnostics, fatal included.
    pub errors: usize,
    /// Warning diagnostics.
    pub warnings: usize,
    /// Everything reported during the run.
    pub diagnostics: Diagnostics,
}

impl RunSummary {
    /// Process exit status: 0 when no error was reported.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.errors > 0)
    }
}

/// Runs the extractor and generator over a project.
pub struct Preprocessor;

impl Preprocessor {
    /// Performs one run.
    ///
    /// Problems inside a unit become diagnostics of the summary; only
    /// problems with the run itself are returned as errors.
    ///
    /// # Errors
    ///
    /// Fails when the project root is not a directory, the settings cannot be
    /// loaded, or the output directory cannot be prepared or written.
    pub fn run(options: &RunOptions) -> Result<RunSummary> {
        let root = normalize(&std::path::absolute(&options.project_root)?);
        if !root.is_dir() {
            return Err(Error::new(ErrorKind::Settings(format!(
                "project root '{}' is not a directory",
                root.display()
            ))));
        }
        let settings = load_settings(&root, options.settings.as_deref())?;
        let output_dir = settings.output_dir(&root)?;
        info!(root = %root.display(), output = %output_dir.display(), "starting run");

        let mut loader_config = settings.loader_config();
        loader_config.include_paths = loader_config
            .include_paths
            .iter()
            .map(|p| normalize(&root.join(p)))
            .collect();
        let include_paths = loader_config.include_paths.clone();
        let loader = UnitLoader::new(loader_config);

        let mut ctx = BuildContext::new(
            settings
                .builder_config()
                .with_tag_window(options.tag_window)
                .with_project_root(&root)
                .with_implicit_struct_rtti(options.implicit_struct_rtti),
        );
        let controller = BuildController::new(&output_dir, options.rebuild);
        controller.prepare()?;

        let units = controller.collect_units(&root)?;
        let mut summary = RunSummary {
            units_scanned: units.len(),
            ..RunSummary::default()
        };
        let mut units_built = 0;
        for unit in &units {
            if !controller.needs_regeneration(unit) {
                summary.units_skipped += 1;
                continue;
            }
            info!(unit = %unit.display(), "parsing unit");
            let parsed = match loader.load(unit) {
                Ok(parsed) => parsed,
                Err(err) => {
                    ctx.report(&err);
                    summary.units_aborted += 1;
                    continue;
                }
            };
            match Builder::new(&mut ctx).build(&parsed) {
                UnitStatus::Built => units_built += 1,
                UnitStatus::Aborted => summary.units_aborted += 1,
            }
        }

        let (tree, source_files, mut diagnostics) = ctx.into_parts();
        if options.dump && units_built > 0 {
            write_dump(&tree, &output_dir.join(DUMP_FILE_NAME))?;
        }

        let generator = settings.generator_config().with_include_paths(include_paths);
        let report = write_outputs(&tree, &source_files, &generator, &output_dir)?;
        for err in &report.errors {
            warn!("{err}");
            diagnostics.record(err);
        }

        summary.files_written = report.written;
        summary.errors = diagnostics.error_count();
        summary.warnings = diagnostics.warning_count();
        summary.diagnostics = diagnostics;
        info!(
            scanned = summary.units_scanned,
            skipped = summary.units_skipped,
            aborted = summary.units_aborted,
            written = summary.files_written.len(),
            errors = summary.errors,
            warnings = summary.warnings,
            "run finished"
        );
        Ok(summary)
    }
}

fn load_settings(root: &Path, explicit: Option<&Path>) -> Result<Settings> {
    let path = Settings::locate(root, explicit);
    if explicit.is_none() && !path.exists() {
        warn!(path = %path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }
    Settings::load(&path)
}
