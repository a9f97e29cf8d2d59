//! Token types for C++ headers.
//!
//! Tokens are the output of the lexer and input to the preprocessor pass and
//! the declaration parser.

/// Where a token sits in the header text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset past the last character.
    pub end: usize,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// True when `next` starts right where this span ends, as the two `>`
    /// of a shift do.
    #[must_use]
    pub const fn touches(&self, next: &Self) -> bool {
        self.end == next.start
    }
}

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the 1-based line this token starts on.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.span.line
    }

    /// Returns true if this token is the given punctuator.
    #[must_use]
    pub fn is_punct(&self, punct: &str) -> bool {
        matches!(&self.kind, TokenKind::Punct(p) if *p == punct)
    }

    /// Returns true if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Keyword(k) if k == keyword)
    }

    /// Returns true if this token is an identifier with the given text.
    #[must_use]
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(i) if i == name)
    }

    /// Returns the identifier text, if this is an identifier.
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the spelling of this token as it appeared in source.
    #[must_use]
    pub fn spelling(&self) -> &str {
        self.kind.spelling()
    }
}

/// Token types for C++ headers.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Identifier such as `Foo` or `TCLASS`.
    Ident(String),
    /// Reserved word such as `class` or `const`.
    Keyword(String),
    /// Numeric literal, kept verbatim (`0x10u`, `1.5f`).
    Number(String),
    /// String literal including quotes and any prefix.
    Str(String),
    /// Character literal including quotes.
    Char(String),
    /// Operator or punctuator (`::`, `{`, `<`).
    Punct(&'static str),
    /// Preprocessor directive text after `#`, continuations joined.
    Directive(String),
    /// Comment text including the delimiters.
    Comment(String),
    /// End of input.
    Eof,
    /// Lexer error.
    Error(String),
}

impl TokenKind {
    /// Returns true if this token kind should be ignored during parsing.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Returns true for identifiers and keywords.
    #[must_use]
    pub const fn is_word(&self) -> bool {
        matches!(self, Self::Ident(_) | Self::Keyword(_))
    }

    /// Returns true for numeric, string and character literals.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Str(_) | Self::Char(_))
    }

    /// Returns the verbatim spelling carried by this token.
    #[must_use]
    pub fn spelling(&self) -> &str {
        match self {
            Self::Ident(s)
            | Self::Keyword(s)
            | Self::Number(s)
            | Self::Str(s)
            | Self::Char(s)
            | Self::Directive(s)
            | Self::Comment(s)
            | Self::Error(s) => s,
            Self::Punct(p) => p,
            Self::Eof => "",
        }
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ident(_) => "identifier",
            Self::Keyword(_) => "keyword",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Char(_) => "character",
            Self::Punct(_) => "punctuation",
            Self::Directive(_) => "directive",
            Self::Comment(_) => "comment",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }
}

/// Reserved words recognized by the lexer.
pub const KEYWORDS: &[&str] = &[
    "alignas",
    "alignof",
    "auto",
    "bool",
    "break",
    "case",
    "catch",
    "char",
    "char8_t",
    "char16_t",
    "char32_t",
    "class",
    "const",
    "consteval",
    "constexpr",
    "constinit",
    "const_cast",
    "continue",
    "decltype",
    "default",
    "delete",
    "do",
    "double",
    "dynamic_cast",
    "else",
    "enum",
    "explicit",
    "export",
    "extern",
    "false",
    "float",
    "for",
    "friend",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "mutable",
    "namespace",
    "new",
    "noexcept",
    "nullptr",
    "operator",
    "private",
    "protected",
    "public",
    "register",
    "reinterpret_cast",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "static_assert",
    "static_cast",
    "struct",
    "switch",
    "template",
    "this",
    "thread_local",
    "throw",
    "true",
    "try",
    "typedef",
    "typeid",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "void",
    "volatile",
    "wchar_t",
    "while",
];

/// Keywords that name (or modify) builtin types.
pub const BUILTIN_TYPE_KEYWORDS: &[&str] = &[
    "auto", "bool", "char", "char8_t", "char16_t", "char32_t", "double", "float", "int", "long",
    "short", "signed", "unsigned", "void", "wchar_t",
];

/// Punctuators, longest first so the lexer can take the longest match.
///
/// `>>` and `>>=` are deliberately absent: closing template brackets always
/// lex as separate `>` tokens.
pub const PUNCTUATORS: &[&str] = &[
    "->*", "<=>", "<<=", "...", "::", "->", "<<", "<=", ">=", "==", "!=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", ".*", "{", "}", "[", "]", "(", ")", "<", ">",
    ";", ":", ",", ".", "?", "=", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "#",
];

/// Returns true if `word` is a reserved word.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}
