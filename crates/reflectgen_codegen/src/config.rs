//! Generator configuration.

use std::path::{Path, PathBuf};

/// Suffix appended to the stem of a source file to name its output.
pub const OUTPUT_SUFFIX: &str = ".generated.cpp";

/// Smart-pointer wrapper registered next to every record derived from a
/// common object base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmartPointer {
    /// Qualified name of the object base, e.g. `Tiny3D::Object`.
    pub base: String,
    /// Qualified name of the wrapper template, e.g. `Tiny3D::SmartPtr`.
    pub wrapper: String,
}

impl SmartPointer {
    /// Creates a wrapper setting.
    #[must_use]
    pub fn new(base: impl Into<String>, wrapper: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            wrapper: wrapper.into(),
        }
    }
}

/// Settings shared by every emitted file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Specifiers whose name starts with this prefix never become metadata.
    pub reserved_prefix: String,
    /// Include roots; headers are included relative to the first that contains them.
    pub include_paths: Vec<PathBuf>,
    /// Comment lines at the top of each file, without the `//`.
    pub banner: Vec<String>,
    /// Wrapper registered for descendants of an object base.
    pub smart_pointer: Option<SmartPointer>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: "RTTR".to_string(),
            include_paths: Vec::new(),
            banner: vec![
                "Generated code exported from reflectgen.".to_string(),
                "DO NOT modify this manually! Edit the corresponding header instead!".to_string(),
            ],
            smart_pointer: None,
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the include roots.
    #[must_use]
    pub fn with_include_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to replace the banner.
    #[must_use]
    pub fn with_banner<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.banner = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to register a smart-pointer wrapper for descendants of
    /// an object base.
    #[must_use]
    pub fn with_smart_pointer(mut self, smart_pointer: SmartPointer) -> Self {
        self.smart_pointer = Some(smart_pointer);
        self
    }

    /// Builder method to change the reserved specifier prefix.
    #[must_use]
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    /// Spelling of `header` in an `#include` directive: relative to the
    /// first include root containing it, else the bare file name.
    #[must_use]
    pub fn include_spelling(&self, header: &Path) -> String {
        let relative = self
            .include_paths
            .iter()
            .find_map(|root| header.strip_prefix(root).ok())
            .filter(|rel| !rel.as_os_str().is_empty());
        let shown = match relative {
            Some(rel) => rel.to_path_buf(),
            None => header
                .file_name()
                .map_or_else(|| header.to_path_buf(), PathBuf::from),
        };
        shown
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Output file name for a source file: `<stem>.generated.cpp`.
#[must_use]
pub fn output_file_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{OUTPUT_SUFFIX}")
}
