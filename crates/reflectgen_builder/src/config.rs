//! Builder configuration.

use std::path::{Path, PathBuf};

use crate::tags::TagKind;

/// Lines searched above a declaration for its annotation.
pub const DEFAULT_TAG_WINDOW: u32 = 3;

/// Prefix of specifiers consumed by reflectgen itself.
pub const RESERVED_PREFIX: &str = "RTTR";
/// Display name of a property accessor.
pub const FUNC_NAME: &str = "RTTRFuncName";
/// Accessor role: `"getter"` or `"setter"`.
pub const FUNC_TYPE: &str = "RTTRFuncType";
/// Marks a static factory as a constructor.
pub const AS_CONSTRUCTOR: &str = "RTTRAsConstructor";
/// Forces raw-pointer construction.
pub const CONSTRUCT_AS_POINTER: &str = "RTTRConstructAsPointer";
/// Forces by-value construction.
pub const CONSTRUCT_AS_OBJECT: &str = "RTTRConstructAsObject";

/// Standard containers reflected without annotations.
pub const STD_CONTAINERS: &[&str] = &[
    "std::vector",
    "std::list",
    "std::deque",
    "std::queue",
    "std::stack",
    "std::priority_queue",
    "std::set",
    "std::multiset",
    "std::map",
    "std::multimap",
    "std::unordered_set",
    "std::unordered_multiset",
    "std::unordered_map",
    "std::unordered_multimap",
];

/// Names of the annotation macros.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagNames {
    /// Class tag.
    pub class: String,
    /// Struct tag.
    pub structure: String,
    /// Function tag.
    pub function: String,
    /// Property tag.
    pub property: String,
    /// Enum tag.
    pub enumeration: String,
    /// Enable switch placed inside a record body.
    pub switch: String,
    /// Enable-friend tag placed inside a record body.
    pub friend: String,
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            class: "TCLASS".into(),
            structure: "TSTRUCT".into(),
            function: "TFUNCTION".into(),
            property: "TPROPERTY".into(),
            enumeration: "TENUM".into(),
            switch: "TRTTI_ENABLE".into(),
            friend: "TRTTI_FRIEND".into(),
        }
    }
}

impl TagNames {
    /// Maps a macro name onto its tag kind.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<TagKind> {
        [
            (&self.class, TagKind::Class),
            (&self.structure, TagKind::Struct),
            (&self.function, TagKind::Function),
            (&self.property, TagKind::Property),
            (&self.enumeration, TagKind::Enum),
            (&self.switch, TagKind::Switch),
            (&self.friend, TagKind::Friend),
        ]
        .into_iter()
        .find_map(|(macro_name, kind)| (macro_name == name).then_some(kind))
    }
}

/// Configuration for building the declaration tree.
#[derive(Clone, Debug)]
pub struct BuilderConfig {
    /// How many lines above a declaration its tag may sit.
    pub tag_window: u32,
    /// Only files under this directory are generated for.
    pub project_root: Option<PathBuf>,
    /// Tagged structs are reflected without the enable switch.
    pub implicit_struct_rtti: bool,
    /// Annotation macro names.
    pub tags: TagNames,
    /// Qualified names of records reflected, public methods included, without
    /// any annotation.
    pub builtin_classes: Vec<String>,
    /// Records deriving from this class always construct as raw pointers.
    pub pointer_base: Option<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            tag_window: DEFAULT_TAG_WINDOW,
            project_root: None,
            implicit_struct_rtti: false,
            tags: TagNames::default(),
            builtin_classes: STD_CONTAINERS.iter().map(|&c| c.to_string()).collect(),
            pointer_base: None,
        }
    }
}

impl BuilderConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the tag window.
    #[must_use]
    pub fn with_tag_window(mut self, lines: u32) -> Self {
        self.tag_window = lines;
        self
    }

    /// Builder method to restrict generation to a project directory.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Builder method to reflect tagged structs without the switch.
    #[must_use]
    pub fn with_implicit_struct_rtti(mut self, enabled: bool) -> Self {
        self.implicit_struct_rtti = enabled;
        self
    }

    /// Builder method to rename the annotation macros.
    #[must_use]
    pub fn with_tags(mut self, tags: TagNames) -> Self {
        self.tags = tags;
        self
    }

    /// Builder method to replace the builtin classes.
    #[must_use]
    pub fn with_builtin_classes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtin_classes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the base whose descendants construct as raw
    /// pointers.
    #[must_use]
    pub fn with_pointer_base(mut self, base: impl Into<String>) -> Self {
        self.pointer_base = Some(base.into());
        self
    }

    /// Whether the record with hierarchy name `qualified` is a builtin class.
    #[must_use]
    pub fn is_builtin(&self, qualified: &str) -> bool {
        let qualified = qualified.trim_start_matches("::");
        self.builtin_classes
            .iter()
            .any(|c| c.trim_start_matches("::") == qualified)
    }

    /// Whether output may be generated for `path`.
    #[must_use]
    pub fn is_in_project(&self, path: &Path) -> bool {
        self.project_root
            .as_deref()
            .is_none_or(|root| path.starts_with(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_macro_names_map_to_kinds() {
        let tags = TagNames::default();
        assert_eq!(tags.kind_of("TCLASS"), Some(TagKind::Class));
        assert_eq!(tags.kind_of("TRTTI_ENABLE"), Some(TagKind::Switch));
        assert_eq!(tags.kind_of("TRTTI_FRIEND"), Some(TagKind::Friend));
        assert_eq!(tags.kind_of("DLL_API"), None);
    }

    #[test]
    fn renamed_tags() {
        let tags = TagNames {
            property: "REFLECT_PROP".into(),
            ..TagNames::default()
        };
        let config = BuilderConfig::new().with_tags(tags);
        assert_eq!(config.tags.kind_of("REFLECT_PROP"), Some(TagKind::Property));
        assert_eq!(config.tags.kind_of("TPROPERTY"), None);
    }

    #[test]
    fn builtin_classes_match_whole_names() {
        let config = BuilderConfig::new();
        assert!(config.is_builtin("std::vector"));
        assert!(config.is_builtin("::std::unordered_multimap"));
        assert!(!config.is_builtin("vector"));
        assert!(!config.is_builtin("mystd::vector"));
        assert!(!config.is_builtin("std::array"));

        let custom = BuilderConfig::new()
            .with_builtin_classes(["::core::Array"])
            .with_pointer_base("core::Object");
        assert!(custom.is_builtin("core::Array"));
        assert!(!custom.is_builtin("std::vector"));
        assert_eq!(custom.pointer_base.as_deref(), Some("core::Object"));
    }

    #[test]
    fn project_root_filter() {
        let open = BuilderConfig::new();
        assert!(open.is_in_project(Path::new("/usr/include/vector")));

        let scoped = BuilderConfig::new()
            .with_project_root("/work/game")
            .with_tag_window(5);
        assert_eq!(scoped.tag_window, 5);
        assert!(scoped.is_in_project(Path::new("/work/game/src/actor.h")));
        assert!(!scoped.is_in_project(Path::new("/work/engine/core.h")));
    }
}
