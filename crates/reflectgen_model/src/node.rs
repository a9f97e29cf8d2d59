//! Declaration node payloads.
//!
//! The node kind set is closed, so payloads are one sum type matched
//! exhaustively by the builder, the template instantiator and the generator.

use std::collections::BTreeMap;
use std::fmt;

use reflectgen_foundation::{FileInfo, Specifier};

/// Handle to a node in a [`crate::DeclTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Annotation data shared by every reflected declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclInfo {
    /// Specifiers of the attached annotation, in source order.
    pub specifiers: Vec<Specifier>,
    /// Where the declaration lives.
    pub file_info: FileInfo,
}

impl DeclInfo {
    /// Creates declaration info.
    #[must_use]
    pub fn new(specifiers: Vec<Specifier>, file_info: FileInfo) -> Self {
        Self {
            specifiers,
            file_info,
        }
    }

    /// Finds a specifier by exact name.
    #[must_use]
    pub fn specifier(&self, name: &str) -> Option<&Specifier> {
        reflectgen_foundation::specifier::find(&self.specifiers, name)
    }
}

/// A struct or class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    /// Annotation data.
    pub decl: DeclInfo,
    /// Qualified base name to base node. Non-owning.
    pub base_classes: BTreeMap<String, NodeId>,
    /// The enable switch was found in the body.
    pub rtti_enabled: bool,
    /// Base names listed in the enable switch.
    pub rtti_base_class_names: Vec<String>,
    /// Private and protected members are reflected.
    pub rtti_friend: bool,
    /// Constructors build raw pointers rather than objects.
    pub construct_as_pointer: bool,
    /// At least one constructor was declared or synthesized.
    pub has_constructor: bool,
    /// A default constructor was declared or synthesized.
    pub has_default_constructor: bool,
    /// Declares pure virtual functions.
    pub is_abstract: bool,
}

impl Record {
    /// Creates an enabled record.
    #[must_use]
    pub fn new(decl: DeclInfo) -> Self {
        Self {
            decl,
            rtti_enabled: true,
            ..Self::default()
        }
    }
}

/// Template parameter categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateParamKind {
    /// `typename T`
    Type,
    /// `int N`
    NonType,
    /// `template <typename> class C`
    TemplateTemplate,
}

impl TemplateParamKind {
    /// Name used in the debug dump.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::NonType => "Non-Type",
            Self::TemplateTemplate => "Template-Template",
        }
    }
}

/// One formal template parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateParam {
    /// Formal name.
    pub name: String,
    /// Type spelling; the name itself for type parameters.
    pub type_spelling: String,
    /// Category.
    pub kind: TemplateParamKind,
    /// Default argument as written.
    pub default: Option<String>,
}

/// Template data of a class or function template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateInfo {
    /// Formal parameters in declaration order.
    pub params: Vec<TemplateParam>,
    /// This node is an instance with concrete arguments.
    pub is_specialization: bool,
    /// Concrete arguments of an instance.
    pub actual_args: Vec<String>,
}

/// A function entry grouping overloads or property accessors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunctionEntry {
    /// Children are getter/setter accessors.
    pub is_property: bool,
    /// Annotation data of the first overload.
    pub decl: DeclInfo,
}

/// Overload categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverloadKind {
    /// Static member function.
    Static,
    /// Non-static member function.
    Instance,
    /// Namespace-level function.
    Free,
    /// Constructor; `is_normal` is false for tagged static factories.
    Constructor {
        /// A real constructor rather than a factory function.
        is_normal: bool,
    },
    /// Destructor. Recorded, never generated.
    Destructor,
}

impl OverloadKind {
    /// Name used in the debug dump.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "Static Function",
            Self::Instance => "Instance Function",
            Self::Free => "Overload Function",
            Self::Constructor { .. } => "Constructor",
            Self::Destructor => "Destructor",
        }
    }
}

/// A function parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Param {
    /// Type spelling.
    pub ty: String,
    /// Name, possibly empty.
    pub name: String,
    /// Default argument as written.
    pub default_value: Option<String>,
}

impl Param {
    /// Creates a parameter without a default.
    #[must_use]
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            default_value: None,
        }
    }
}

/// One concrete overload of a function entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overload {
    /// Category.
    pub kind: OverloadKind,
    /// Identifier in source. Differs from the entry name for accessors.
    pub source_name: String,
    /// `const`-qualified member function.
    pub is_const: bool,
    /// Getter role; meaningful under property entries only.
    pub is_getter: bool,
    /// Return type spelling.
    pub return_type: String,
    /// Parameters in order.
    pub params: Vec<Param>,
    /// Annotation data.
    pub decl: DeclInfo,
}

impl Overload {
    /// Creates an overload with no parameters.
    #[must_use]
    pub fn new(
        kind: OverloadKind,
        source_name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source_name: source_name.into(),
            is_const: false,
            is_getter: false,
            return_type: return_type.into(),
            params: Vec::new(),
            decl: DeclInfo::default(),
        }
    }

    /// Comma-joined parameter types.
    #[must_use]
    pub fn param_types(&self) -> String {
        self.params
            .iter()
            .map(|p| p.ty.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A reflected field or global variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Property {
    /// Type spelling.
    pub data_type: String,
    /// Static member or namespace-level variable.
    pub is_static: bool,
    /// Annotation data.
    pub decl: DeclInfo,
}

/// A reflected enum.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumInfo {
    /// Annotation data.
    pub decl: DeclInfo,
    /// `enum class`.
    pub is_scoped: bool,
}

/// Kind-specific node payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    /// Namespace; the tree root is the unnamed global namespace.
    Namespace,
    /// A `struct`.
    Struct(Record),
    /// A `class`.
    Class(Record),
    /// A class template or one of its instances.
    ClassTemplate {
        /// Record data.
        record: Record,
        /// Template data.
        template: TemplateInfo,
    },
    /// Function entry.
    Function(FunctionEntry),
    /// Overload under a function entry.
    Overload(Overload),
    /// Field or global variable.
    Property(Property),
    /// Enum.
    Enum(EnumInfo),
    /// Enumerator.
    EnumConstant {
        /// Value as unsigned bits.
        value: u64,
    },
    /// A function template or one of its instances.
    FunctionTemplate {
        /// Entry data.
        entry: FunctionEntry,
        /// Template data.
        template: TemplateInfo,
    },
}

impl NodeData {
    /// Name used in logs and the debug dump.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Namespace => "Namespace",
            Self::Struct(_) => "Struct",
            Self::Class(_) => "Class",
            Self::ClassTemplate { .. } => "Class Template",
            Self::Function(_) => "Function",
            Self::Overload(o) => o.kind.as_str(),
            Self::Property(_) => "Property",
            Self::Enum(_) => "Enum",
            Self::EnumConstant { .. } => "Enum Constant",
            Self::FunctionTemplate { .. } => "Function Template",
        }
    }

    /// Record data of structs, classes and class templates.
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Struct(r) | Self::Class(r) | Self::ClassTemplate { record: r, .. } => Some(r),
            _ => None,
        }
    }

    /// Mutable record data.
    pub fn record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Struct(r) | Self::Class(r) | Self::ClassTemplate { record: r, .. } => Some(r),
            _ => None,
        }
    }

    /// Entry data of function entries and function templates.
    #[must_use]
    pub fn entry(&self) -> Option<&FunctionEntry> {
        match self {
            Self::Function(e) | Self::FunctionTemplate { entry: e, .. } => Some(e),
            _ => None,
        }
    }

    /// Template data of templates.
    #[must_use]
    pub fn template(&self) -> Option<&TemplateInfo> {
        match self {
            Self::ClassTemplate { template, .. } | Self::FunctionTemplate { template, .. } => {
                Some(template)
            }
            _ => None,
        }
    }

    /// Mutable template data.
    pub fn template_mut(&mut self) -> Option<&mut TemplateInfo> {
        match self {
            Self::ClassTemplate { template, .. } | Self::FunctionTemplate { template, .. } => {
                Some(template)
            }
            _ => None,
        }
    }

    /// Annotation data, for kinds that carry it.
    #[must_use]
    pub fn decl(&self) -> Option<&DeclInfo> {
        match self {
            Self::Namespace | Self::EnumConstant { .. } => None,
            Self::Struct(r) | Self::Class(r) | Self::ClassTemplate { record: r, .. } => {
                Some(&r.decl)
            }
            Self::Function(e) | Self::FunctionTemplate { entry: e, .. } => Some(&e.decl),
            Self::Overload(o) => Some(&o.decl),
            Self::Property(p) => Some(&p.decl),
            Self::Enum(e) => Some(&e.decl),
        }
    }

    /// Mutable annotation data.
    pub fn decl_mut(&mut self) -> Option<&mut DeclInfo> {
        match self {
            Self::Namespace | Self::EnumConstant { .. } => None,
            Self::Struct(r) | Self::Class(r) | Self::ClassTemplate { record: r, .. } => {
                Some(&mut r.decl)
            }
            Self::Function(e) | Self::FunctionTemplate { entry: e, .. } => Some(&mut e.decl),
            Self::Overload(o) => Some(&mut o.decl),
            Self::Property(p) => Some(&mut p.decl),
            Self::Enum(e) => Some(&mut e.decl),
        }
    }

    /// True for structs, classes and class templates.
    #[must_use]
    pub fn is_record(&self) -> bool {
        self.record().is_some()
    }

    /// True for nodes that can own members: namespaces and records.
    #[must_use]
    pub fn is_scope(&self) -> bool {
        matches!(self, Self::Namespace) || self.is_record()
    }
}

/// A node in the declaration tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Name, unique among siblings.
    pub name: String,
    /// Owning parent. `None` only for the root.
    pub parent: Option<NodeId>,
    /// Owned children by name; iteration follows name order.
    pub children: BTreeMap<String, NodeId>,
    /// Kind-specific payload.
    pub data: NodeData,
}
