//! Type spellings.
//!
//! Declarations carry their types as strings. These helpers render token runs
//! the way clang prints types (`const std::string &`, `int *`, `Vec<int>`) and
//! pick template-ids back apart.

use crate::token::{Token, TokenKind};

/// Renders a run of tokens as a normalized type spelling.
#[must_use]
pub fn spell(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&TokenKind> = None;
    for token in tokens.iter().filter(|t| !t.kind.is_trivia()) {
        if let Some(p) = prev {
            if needs_space(p, &token.kind) {
                out.push(' ');
            }
        }
        out.push_str(token.spelling());
        prev = Some(&token.kind);
    }
    out
}

fn is_ptr_op(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Punct("*" | "&" | "&&"))
}

fn needs_space(prev: &TokenKind, cur: &TokenKind) -> bool {
    match (prev, cur) {
        (_, TokenKind::Punct("::" | "<" | ">" | "," | ")" | "]" | "...")) => false,
        (TokenKind::Punct("::" | "<" | "(" | "["), _) => false,
        (TokenKind::Punct(","), _) => true,
        (p, c) if is_ptr_op(c) => !is_ptr_op(p),
        (p, _) if is_ptr_op(p) => false,
        (p, TokenKind::Punct("(")) => p.is_word(),
        (p, TokenKind::Punct("[")) => p.is_word() || matches!(p, TokenKind::Punct(">")),
        _ => true,
    }
}

/// A template-id found inside a spelling: `ns::Vec<float>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateUse {
    /// Template name as written, possibly qualified.
    pub name: String,
    /// Argument spellings, trimmed.
    pub args: Vec<String>,
}

impl TemplateUse {
    /// Spells the template-id back, e.g. `Vec<float, 3>`.
    #[must_use]
    pub fn spelling(&self) -> String {
        format!("{}<{}>", self.name, self.args.join(", "))
    }
}

/// Splits `Name<a, b>` into its name and top-level arguments.
///
/// Returns `None` unless the whole string is a single template-id.
#[must_use]
pub fn split_template_args(spelling: &str) -> Option<TemplateUse> {
    let spelling = spelling.trim();
    let open = spelling.find('<')?;
    let close = matching_angle(spelling, open)?;
    if close != spelling.len() - 1 {
        return None;
    }
    let name = spelling[..open].trim();
    if name.is_empty() || !name.chars().all(|c| is_ident_char(c) || c == ':') {
        return None;
    }
    Some(TemplateUse {
        name: name.to_string(),
        args: split_top_level(&spelling[open + 1..close]),
    })
}

/// Finds every template-id in a spelling, outermost first.
///
/// `const Map<Key, Vec<int>> &` yields `Map<Key, Vec<int>>` then `Vec<int>`.
#[must_use]
pub fn template_uses(spelling: &str) -> Vec<TemplateUse> {
    let mut uses = Vec::new();
    collect_uses(spelling, &mut uses);
    uses
}

fn collect_uses(spelling: &str, uses: &mut Vec<TemplateUse>) {
    let bytes = spelling.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let name_end = spelling[..i].trim_end().len();
        let name_start = spelling[..name_end]
            .char_indices()
            .rfind(|&(_, c)| !(is_ident_char(c) || c == ':'))
            .map_or(0, |(p, c)| p + c.len_utf8());
        let Some(close) = matching_angle(spelling, i) else {
            return;
        };
        let name = spelling[name_start..name_end].trim_start_matches(':');
        if !name.is_empty() {
            let at = uses.len();
            let args = split_top_level(&spelling[i + 1..close]);
            for arg in &args {
                collect_uses(arg, uses);
            }
            uses.insert(
                at,
                TemplateUse {
                    name: name.to_string(),
                    args,
                },
            );
        }
        i = close + 1;
    }
}

/// Splits at commas outside any `<>`, `()`, `[]` or `{}` nesting.
#[must_use]
pub fn split_top_level(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn matching_angle(spelling: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in spelling.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => {
                depth -= 1;
                if depth == 0 {
                    return (c == '>').then_some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replaces whole identifiers in `spelling` using `lookup`.
///
/// Identifiers that are part of a longer identifier are left alone, so
/// substituting `T` never touches `Type` or `T2`.
#[must_use]
pub fn replace_identifiers<'a>(
    spelling: &str,
    mut lookup: impl FnMut(&str) -> Option<&'a str>,
) -> String {
    let mut out = String::with_capacity(spelling.len());
    let mut word = String::new();
    for c in spelling.chars() {
        if is_ident_char(c) {
            word.push(c);
            continue;
        }
        flush_word(&mut out, &mut word, &mut lookup);
        out.push(c);
    }
    flush_word(&mut out, &mut word, &mut lookup);
    out
}

fn flush_word<'a>(
    out: &mut String,
    word: &mut String,
    lookup: &mut impl FnMut(&str) -> Option<&'a str>,
) {
    if word.is_empty() {
        return;
    }
    let starts_with_digit = word.chars().next().is_some_and(|c| c.is_ascii_digit());
    match lookup(word) {
        Some(replacement) if !starts_with_digit => out.push_str(replacement),
        _ => out.push_str(word),
    }
    word.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use proptest::prelude::*;

    fn spell_src(source: &str) -> String {
        let tokens = Lexer::tokenize_all(source);
        spell(&tokens[..tokens.len() - 1])
    }

    #[test]
    fn spells_like_clang() {
        assert_eq!(spell_src("const std::string&"), "const std::string &");
        assert_eq!(spell_src("int*"), "int *");
        assert_eq!(spell_src("char const * const"), "char const *const");
        assert_eq!(spell_src("std::map< int ,Foo<int> >"), "std::map<int, Foo<int>>");
        assert_eq!(spell_src("unsigned  long long"), "unsigned long long");
        assert_eq!(spell_src("Args &&..."), "Args &&...");
        assert_eq!(spell_src("int**"), "int **");
    }

    #[test]
    fn splits_template_id() {
        let split = split_template_args("ns::Vec<float, Pair<int, 2>>").unwrap();
        assert_eq!(split.name, "ns::Vec");
        assert_eq!(split.args, vec!["float", "Pair<int, 2>"]);
        assert!(split_template_args("Vec<int> &").is_none());
        assert!(split_template_args("int").is_none());
    }

    #[test]
    fn finds_nested_uses_outermost_first() {
        let uses = template_uses("const Map<Key, Vec<int>> &");
        assert_eq!(uses.len(), 2);
        assert_eq!(uses[0].name, "Map");
        assert_eq!(uses[0].args, vec!["Key", "Vec<int>"]);
        assert_eq!(uses[1].spelling(), "Vec<int>");
    }

    #[test]
    fn finds_sibling_uses() {
        let uses = template_uses("Pair<A<int>, B<float>>");
        let names: Vec<_> = uses.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Pair", "A", "B"]);
    }

    #[test]
    fn replaces_whole_identifiers_only() {
        let out = replace_identifiers("const T & T2 Type<T>", |w| (w == "T").then_some("float"));
        assert_eq!(out, "const float & T2 Type<float>");
    }

    proptest! {
        #[test]
        fn replace_with_none_is_identity(s in "[a-zA-Z0-9_ <>,:*&]{0,40}") {
            prop_assert_eq!(replace_identifiers(&s, |_| None), s);
        }

        #[test]
        fn split_top_level_roundtrips_simple_lists(
            items in prop::collection::vec("[a-z]{1,6}", 1..5)
        ) {
            let joined = items.join(", ");
            prop_assert_eq!(split_top_level(&joined), items);
        }
    }
}
