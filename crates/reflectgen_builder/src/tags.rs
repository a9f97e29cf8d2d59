//! Tag tables: scanned annotations indexed by file, kind and line.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use reflectgen_foundation::Specifier;

/// Annotation categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagKind {
    /// Precedes a `class`.
    Class,
    /// Precedes a `struct`.
    Struct,
    /// Precedes a function.
    Function,
    /// Precedes a field, global or property accessor.
    Property,
    /// Precedes an enum.
    Enum,
    /// Enable switch inside a record body.
    Switch,
    /// Enable-friend marker inside a record body.
    Friend,
}

/// One scanned annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Category.
    pub kind: TagKind,
    /// Line of the macro name.
    pub line: u32,
    /// Specifiers, for every kind but the switch.
    pub specifiers: Vec<Specifier>,
    /// Base names, for the switch.
    pub bases: Vec<String>,
}

impl Tag {
    /// Creates a tag carrying specifiers.
    #[must_use]
    pub fn new(kind: TagKind, line: u32, specifiers: Vec<Specifier>) -> Self {
        Self {
            kind,
            line,
            specifiers,
            bases: Vec::new(),
        }
    }

    /// Creates an enable switch listing `bases`.
    #[must_use]
    pub fn switch(line: u32, bases: Vec<String>) -> Self {
        Self {
            kind: TagKind::Switch,
            line,
            specifiers: Vec::new(),
            bases,
        }
    }
}

type KindTable = HashMap<TagKind, BTreeMap<u32, Tag>>;

/// Tags of every file seen so far.
#[derive(Clone, Debug)]
pub struct TagTables {
    window: u32,
    files: HashMap<PathBuf, KindTable>,
    loaded: HashSet<PathBuf>,
}

impl TagTables {
    /// Creates empty tables searching `window` lines above a declaration.
    #[must_use]
    pub fn new(window: u32) -> Self {
        Self {
            window,
            files: HashMap::new(),
            loaded: HashSet::new(),
        }
    }

    /// Stores a tag. A tag of the same kind on the same line is replaced, so
    /// re-reading a shared header is harmless.
    pub fn insert(&mut self, path: &Path, tag: Tag) {
        self.files
            .entry(path.to_path_buf())
            .or_default()
            .entry(tag.kind)
            .or_default()
            .insert(tag.line, tag);
    }

    /// Whether the annotations of `path` were already loaded by an earlier
    /// translation unit.
    #[must_use]
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.contains(path)
    }

    /// Marks the annotations of `path` as loaded.
    pub fn mark_loaded(&mut self, path: &Path) {
        self.loaded.insert(path.to_path_buf());
    }

    /// Number of stored tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files
            .values()
            .flat_map(HashMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Returns true if no tag is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the nearest tag of `kind` above `start_line`.
    ///
    /// Lines `start_line - 1` down to `start_line - window` are searched,
    /// stopping above `floor_line`.
    #[must_use]
    pub fn find_preceding(
        &self,
        kind: TagKind,
        path: &Path,
        start_line: u32,
        floor_line: u32,
    ) -> Option<&Tag> {
        self.find_preceding_any(&[kind], path, start_line, floor_line)
    }

    /// Like [`Self::find_preceding`], accepting any of `kinds`. On a line
    /// holding several, the earlier kind in `kinds` wins.
    #[must_use]
    pub fn find_preceding_any(
        &self,
        kinds: &[TagKind],
        path: &Path,
        start_line: u32,
        floor_line: u32,
    ) -> Option<&Tag> {
        let table = self.files.get(path)?;
        let lowest = start_line.saturating_sub(self.window).max(floor_line + 1);
        (lowest..start_line).rev().find_map(|line| {
            kinds
                .iter()
                .find_map(|kind| table.get(kind).and_then(|lines| lines.get(&line)))
        })
    }

    /// Finds the first tag of `kind` on lines `start..=end`, skipping the
    /// `excluded` line ranges (nested bodies).
    #[must_use]
    pub fn find_within(
        &self,
        kind: TagKind,
        path: &Path,
        start: u32,
        end: u32,
        excluded: &[(u32, u32)],
    ) -> Option<&Tag> {
        self.files
            .get(path)?
            .get(&kind)?
            .range(start..=end)
            .map(|(_, tag)| tag)
            .find(|tag| !excluded.iter().any(|&(lo, hi)| (lo..=hi).contains(&tag.line)))
    }
}

impl Default for TagTables {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TAG_WINDOW)
    }
}
