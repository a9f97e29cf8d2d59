//! The Declaration Source interface.
//!
//! A declaration source describes one translation unit as a tree of cursors
//! ([`Decl`]) plus the annotation macro invocations found in it and the
//! diagnostics the front end produced. The builder only ever talks to this
//! interface, so it can be driven by the bundled header parser or by a
//! hand-assembled [`SyntheticSource`](crate::SyntheticSource).

use std::path::{Path, PathBuf};

use reflectgen_foundation::{FileInfo, Severity};

/// Source extent of a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceRange {
    /// File the declaration appears in.
    pub path: PathBuf,
    /// First line (1-based).
    pub start_line: u32,
    /// Last line (1-based).
    pub end_line: u32,
    /// Column of the first token (1-based).
    pub column: u32,
    /// Byte offset of the first token.
    pub offset: usize,
}

impl SourceRange {
    /// Creates a range covering whole lines.
    #[must_use]
    pub fn lines(path: impl Into<PathBuf>, start_line: u32, end_line: u32) -> Self {
        Self {
            path: path.into(),
            start_line,
            end_line,
            column: 1,
            offset: 0,
        }
    }

    /// Converts into the model's file info.
    #[must_use]
    pub fn file_info(&self) -> FileInfo {
        FileInfo::new(self.path.clone(), self.start_line, self.end_line)
    }
}

/// C++ member access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Access {
    /// `public`
    #[default]
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

/// Which keyword introduced a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordTag {
    /// `class`
    Class,
    /// `struct` (and `union`)
    Struct,
}

impl RecordTag {
    /// Default member access inside a record with this tag.
    #[must_use]
    pub const fn default_access(self) -> Access {
        match self {
            Self::Class => Access::Private,
            Self::Struct => Access::Public,
        }
    }
}

/// Kind of a template parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateParamKind {
    /// `typename T` / `class T`
    Type,
    /// `int N`
    NonType,
    /// `template <typename> class C`
    TemplateTemplate,
}

/// One template parameter as declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateParamDecl {
    /// Parameter name (may be empty for unnamed parameters).
    pub name: String,
    /// Parameter kind.
    pub kind: TemplateParamKind,
    /// Type spelling: the name itself for type parameters, the value type for
    /// non-type parameters, the full head for template-template parameters.
    pub type_spelling: String,
    /// Default argument spelling, if any.
    pub default: Option<String>,
}

/// One function parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamDecl {
    /// Type spelling.
    pub ty: String,
    /// Parameter name (may be empty).
    pub name: String,
    /// Default argument spelling.
    pub default_value: Option<String>,
}

impl ParamDecl {
    /// Creates an unnamed parameter of the given type.
    #[must_use]
    pub fn of(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            ..Self::default()
        }
    }

    /// Creates a named parameter.
    #[must_use]
    pub fn named(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            default_value: None,
        }
    }
}

/// What a function declaration is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionRole {
    /// Namespace-scope function.
    Free,
    /// Non-static member function.
    Method,
    /// Static member function.
    StaticMethod,
    /// Constructor.
    Constructor,
    /// Destructor.
    Destructor,
}

/// A function declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDecl {
    /// Role of this function.
    pub role: FunctionRole,
    /// Return type spelling (empty for constructors and destructors).
    pub return_type: String,
    /// Parameters in order.
    pub params: Vec<ParamDecl>,
    /// `const`-qualified member.
    pub is_const: bool,
    /// Declared `virtual`.
    pub is_virtual: bool,
    /// Declared `= 0`.
    pub is_pure: bool,
    /// Declared `= delete`.
    pub is_deleted: bool,
    /// Overloaded operator or conversion function.
    pub is_operator: bool,
    /// Template parameters for function templates.
    pub template: Option<Vec<TemplateParamDecl>>,
    /// Signature key, unique among the overloads of one name in one scope.
    pub usr: String,
}

impl FunctionDecl {
    /// Creates a function of the given role with no parameters.
    #[must_use]
    pub fn new(role: FunctionRole, return_type: impl Into<String>) -> Self {
        Self {
            role,
            return_type: return_type.into(),
            params: Vec::new(),
            is_const: false,
            is_virtual: false,
            is_pure: false,
            is_deleted: false,
            is_operator: false,
            template: None,
            usr: String::new(),
        }
    }

    /// Returns true for a constructor callable without arguments.
    #[must_use]
    pub fn is_default_constructor(&self) -> bool {
        self.role == FunctionRole::Constructor
            && self.params.iter().all(|p| p.default_value.is_some())
    }

    /// Builds the signature key for `name`.
    #[must_use]
    pub fn signature(&self, name: &str) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.ty.as_str()).collect();
        let mut usr = format!("{name}({})", params.join(", "));
        if self.is_const {
            usr.push_str(" const");
        }
        usr
    }
}

/// Declaration kinds reported by a source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclKind {
    /// `namespace name { ... }`
    Namespace,
    /// Class or struct definition (or a class template when `template` is set).
    Record {
        /// Introducing keyword.
        tag: RecordTag,
        /// Has at least one pure virtual function.
        is_abstract: bool,
        /// Template parameters for class templates.
        template: Option<Vec<TemplateParamDecl>>,
    },
    /// One entry of a record's base list; the name is the base type spelling.
    BaseSpecifier {
        /// Inheritance access.
        access: Access,
        /// Virtual inheritance.
        is_virtual: bool,
    },
    /// Any function, member function, constructor or destructor.
    Function(FunctionDecl),
    /// Namespace-scope variable or member field.
    Variable {
        /// Type spelling.
        ty: String,
        /// Declared inside a record.
        is_member: bool,
        /// Declared `static`.
        is_static: bool,
    },
    /// Enumeration.
    Enum {
        /// `enum class` / `enum struct`.
        is_scoped: bool,
    },
    /// Enumerator with its value as an unsigned 64-bit pattern.
    EnumConstant {
        /// Value.
        value: u64,
    },
    /// `template class X<args>;` or `template R f<args>(...);`
    ExplicitInstantiation {
        /// Template name as written (possibly qualified).
        template_name: String,
        /// Actual argument spellings.
        args: Vec<String>,
        /// True for function templates.
        is_function: bool,
    },
}

impl DeclKind {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Record { template: Some(_), .. } => "class template",
            Self::Record {
                tag: RecordTag::Class,
                ..
            } => "class",
            Self::Record {
                tag: RecordTag::Struct,
                ..
            } => "struct",
            Self::BaseSpecifier { .. } => "base specifier",
            Self::Function(_) => "function",
            Self::Variable { .. } => "variable",
            Self::Enum { .. } => "enum",
            Self::EnumConstant { .. } => "enum constant",
            Self::ExplicitInstantiation { .. } => "explicit instantiation",
        }
    }
}

/// A declaration cursor: kind, spelling, extent, access and children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decl {
    /// Declaration kind and kind-specific data.
    pub kind: DeclKind,
    /// Spelling of the declared name.
    pub name: String,
    /// Where the declaration is.
    pub location: SourceRange,
    /// Member access (public outside records).
    pub access: Access,
    /// Lexically nested declarations.
    pub children: Vec<Decl>,
}

impl Decl {
    /// Creates a declaration with no children.
    #[must_use]
    pub fn new(kind: DeclKind, name: impl Into<String>, location: SourceRange) -> Self {
        Self {
            kind,
            name: name.into(),
            location,
            access: Access::Public,
            children: Vec::new(),
        }
    }

    /// Sets the access.
    #[must_use]
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Appends a child declaration.
    #[must_use]
    pub fn with_child(mut self, child: Decl) -> Self {
        self.children.push(child);
        self
    }

    /// Returns true for records (including class templates).
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self.kind, DeclKind::Record { .. })
    }

    /// Returns the base specifiers of a record.
    pub fn bases(&self) -> impl Iterator<Item = &Decl> {
        self.children
            .iter()
            .filter(|c| matches!(c.kind, DeclKind::BaseSpecifier { .. }))
    }
}

/// Token classes inside an annotation invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationTokenKind {
    /// Operators and delimiters.
    Punctuation,
    /// Identifiers.
    Identifier,
    /// Reserved words.
    Keyword,
    /// Numeric, string and character literals.
    Literal,
    /// Comments.
    Comment,
}

/// One raw token of an annotation invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationToken {
    /// Token class.
    pub kind: AnnotationTokenKind,
    /// Verbatim spelling.
    pub text: String,
}

impl AnnotationToken {
    /// Creates a token.
    #[must_use]
    pub fn new(kind: AnnotationTokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// One annotation macro invocation, e.g. `TPROPERTY(RTTRFuncName="x")`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroInvocation {
    /// Macro name.
    pub name: String,
    /// File the invocation appears in.
    pub path: PathBuf,
    /// Line of the macro name.
    pub line: u32,
    /// Raw tokens starting with the macro name itself.
    pub tokens: Vec<AnnotationToken>,
}

/// A diagnostic reported by the front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontendDiagnostic {
    /// Severity.
    pub severity: Severity,
    /// Message.
    pub message: String,
    /// File.
    pub path: PathBuf,
    /// Line.
    pub line: u32,
}

impl FrontendDiagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>, path: &Path, line: u32) -> Self {
        Self {
            severity,
            message: message.into(),
            path: path.to_path_buf(),
            line,
        }
    }
}

/// Supplies the declarations of one translation unit.
pub trait DeclarationSource {
    /// Path of the translation unit.
    fn unit_path(&self) -> &Path;

    /// Diagnostics produced while parsing the unit.
    fn diagnostics(&self) -> &[FrontendDiagnostic];

    /// Annotation macro invocations, in source order per file.
    fn annotations(&self) -> &[MacroInvocation];

    /// Top-level declaration cursors, in source order.
    fn declarations(&self) -> &[Decl];
}
