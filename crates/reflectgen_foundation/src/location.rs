//! Source locations attached to reflected declarations.

use std::path::{Path, PathBuf};

/// Where a declaration lives: file plus 1-based line range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileInfo {
    /// File the declaration appears in.
    pub path: PathBuf,
    /// First line of the declaration.
    pub start_line: u32,
    /// Last line of the declaration.
    pub end_line: u32,
}

impl FileInfo {
    /// Creates a new file info.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, start_line: u32, end_line: u32) -> Self {
        Self {
            path: path.into(),
            start_line,
            end_line,
        }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if `line` falls inside this range.
    #[must_use]
    pub const fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_line_is_inclusive() {
        let info = FileInfo::new("a.h", 3, 9);
        assert!(info.contains_line(3));
        assert!(info.contains_line(9));
        assert!(!info.contains_line(2));
        assert!(!info.contains_line(10));
    }
}
