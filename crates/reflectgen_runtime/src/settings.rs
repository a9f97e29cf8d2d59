//! The `ReflectionSettings.json` document.
//!
//! ```json
//! {
//!     "IncludePath": ["Include", "../External/rttr/src"],
//!     "MacroDefinition": ["T3D_OS_WINDOWS", "T3D_ERR_CORE=0x00004000"],
//!     "OtherFlags": ["-std=c++14"],
//!     "GeneratedPath": "Generated",
//!     "BuiltinClasses": ["std::vector", "std::map"],
//!     "SmartPointer": { "Base": "Tiny3D::Object", "Wrapper": "Tiny3D::SmartPtr" }
//! }
//! ```
//!
//! `BuiltinClasses` defaults to the standard containers; `SmartPointer` is
//! off unless given.
//!
//! Relative include paths are resolved against the directory holding the
//! document.

use std::fs;
use std::path::{Path, PathBuf};

use reflectgen_builder::{BuilderConfig, STD_CONTAINERS};
use reflectgen_codegen::{GeneratorConfig, SmartPointer};
use reflectgen_foundation::{Error, ErrorKind, Result};
use reflectgen_source::LoaderConfig;
use reflectgen_source::loader::normalize;
use serde::{Deserialize, Serialize};

/// Name of the settings document looked up in a directory.
pub const SETTINGS_FILE_NAME: &str = "ReflectionSettings.json";

/// Default output directory, relative to the project root.
pub const DEFAULT_GENERATED_PATH: &str = "Generated";

/// Front-end arguments and output location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// Header search paths.
    #[serde(default)]
    pub include_path: Vec<PathBuf>,
    /// Predefined macros, `NAME` or `NAME=VALUE`.
    #[serde(default)]
    pub macro_definition: Vec<String>,
    /// Extra front-end flags passed through verbatim.
    #[serde(default)]
    pub other_flags: Vec<String>,
    /// Output directory, relative to the project root unless absolute.
    #[serde(default = "default_generated_path")]
    pub generated_path: PathBuf,
    /// Records reflected without annotations.
    #[serde(default = "default_builtin_classes")]
    pub builtin_classes: Vec<String>,
    /// Object base whose descendants construct as pointers and get a
    /// smart-pointer wrapper.
    #[serde(default)]
    pub smart_pointer: Option<SmartPointerSettings>,
}

/// The `SmartPointer` object of the settings document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SmartPointerSettings {
    /// Qualified name of the object base.
    pub base: String,
    /// Qualified name of the wrapper template.
    pub wrapper: String,
}

fn default_generated_path() -> PathBuf {
    PathBuf::from(DEFAULT_GENERATED_PATH)
}

fn default_builtin_classes() -> Vec<String> {
    STD_CONTAINERS.iter().map(|&c| c.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_path: Vec::new(),
            macro_definition: Vec::new(),
            other_flags: Vec::new(),
            generated_path: default_generated_path(),
            builtin_classes: default_builtin_classes(),
            smart_pointer: None,
        }
    }
}

impl Settings {
    /// Parses a settings document.
    ///
    /// # Errors
    ///
    /// Returns a settings error for malformed JSON or mistyped fields.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::new(ErrorKind::Settings(e.to_string())))
    }

    /// Reads and parses the document at `path`, resolving relative include
    /// paths against its directory.
    ///
    /// # Errors
    ///
    /// Returns a settings error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::Settings(format!(
                "cannot read '{}': {e}",
                path.display()
            )))
        })?;
        let mut settings: Self = serde_json::from_str(&text).map_err(|e| {
            Error::new(ErrorKind::Settings(format!("{}: {e}", path.display())))
        })?;
        if let Some(base) = path.parent() {
            settings.resolve_relative_to(base);
        }
        Ok(settings)
    }

    /// Where the settings document of a run lives: `explicit` itself, or
    /// [`SETTINGS_FILE_NAME`] inside it when it is a directory, or inside
    /// `project_root` when nothing was given.
    #[must_use]
    pub fn locate(project_root: &Path, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) if path.is_dir() => path.join(SETTINGS_FILE_NAME),
            Some(path) => path.to_path_buf(),
            None => project_root.join(SETTINGS_FILE_NAME),
        }
    }

    /// Makes relative include paths absolute against `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for path in &mut self.include_path {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Include paths, including `-I` entries of the other flags.
    #[must_use]
    pub fn include_paths(&self) -> Vec<PathBuf> {
        self.include_path
            .iter()
            .cloned()
            .chain(
                self.other_flags
                    .iter()
                    .filter_map(|f| f.strip_prefix("-I"))
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from),
            )
            .collect()
    }

    /// Macro definitions as name and replacement, including `-D` entries of
    /// the other flags. A definition without `=` expands to `1`.
    #[must_use]
    pub fn defines(&self) -> Vec<(String, String)> {
        self.macro_definition
            .iter()
            .map(String::as_str)
            .chain(self.other_flags.iter().filter_map(|f| f.strip_prefix("-D")))
            .filter(|d| !d.is_empty())
            .map(|d| match d.split_once('=') {
                Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
                None => (d.trim().to_string(), "1".to_string()),
            })
            .collect()
    }

    /// The settings rendered as compiler-style arguments.
    #[must_use]
    pub fn front_end_args(&self) -> Vec<String> {
        self.include_path
            .iter()
            .map(|p| format!("-I{}", p.display()))
            .chain(self.macro_definition.iter().map(|d| format!("-D{d}")))
            .chain(self.other_flags.iter().cloned())
            .collect()
    }

    /// Loader configuration for the bundled header front end.
    #[must_use]
    pub fn loader_config(&self) -> LoaderConfig {
        let mut config = LoaderConfig::new();
        config.include_paths = self.include_paths();
        config.defines = self.defines();
        config
    }

    /// Builder configuration carrying the builtin classes and pointer base.
    #[must_use]
    pub fn builder_config(&self) -> BuilderConfig {
        let config =
            BuilderConfig::new().with_builtin_classes(self.builtin_classes.iter().cloned());
        match &self.smart_pointer {
            Some(smart) => config.with_pointer_base(smart.base.clone()),
            None => config,
        }
    }

    /// Generator configuration carrying the smart-pointer wrapper.
    #[must_use]
    pub fn generator_config(&self) -> GeneratorConfig {
        let config = GeneratorConfig::new();
        match &self.smart_pointer {
            Some(smart) => {
                config.with_smart_pointer(SmartPointer::new(&smart.base, &smart.wrapper))
            }
            None => config,
        }
    }

    /// The output directory of a run rooted at `project_root`.
    ///
    /// # Errors
    ///
    /// Returns a settings error when the directory is the project root or
    /// one of its ancestors.
    pub fn output_dir(&self, project_root: &Path) -> Result<PathBuf> {
        let root = normalize(project_root);
        let output = normalize(&root.join(&self.generated_path));
        if root.starts_with(&output) {
            return Err(Error::new(ErrorKind::Settings(format!(
                "GeneratedPath '{}' must not contain the project root '{}'",
                self.generated_path.display(),
                root.display()
            ))));
        }
        Ok(output)
    }
}
