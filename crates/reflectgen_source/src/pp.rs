//! Preprocessor pass.
//!
//! Resolves conditional compilation against a set of macro definitions,
//! reports quoted includes as they are reached, and strips directives from the
//! token stream. No macro expansion happens here.

use std::collections::HashMap;

use reflectgen_foundation::Severity;

use crate::eval;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Object-like macro definitions, name to replacement text.
pub type Defines = HashMap<String, String>;

/// A quoted `#include "..."` in an active region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeDirective {
    /// The path as written between the quotes.
    pub target: String,
    /// Line of the directive.
    pub line: u32,
}

/// Problems found by the pass, by line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassDiagnostic {
    /// Severity.
    pub severity: Severity,
    /// Message.
    pub message: String,
    /// Line.
    pub line: u32,
}

/// Output of the pass.
#[derive(Debug, Default)]
pub struct Preprocessed {
    /// Active tokens, comments included, directives removed. Ends with `Eof`.
    pub tokens: Vec<Token>,
    /// Problems found.
    pub diagnostics: Vec<PassDiagnostic>,
}

#[derive(Clone, Copy, Debug)]
struct Conditional {
    /// Enclosing region was active.
    parent_active: bool,
    /// Some branch has been taken already.
    taken: bool,
    /// Current branch is active.
    active: bool,
    /// `#else` seen.
    seen_else: bool,
    /// Line of the opening directive.
    line: u32,
}

/// Runs the pass over lexed `tokens`.
///
/// `on_include` is invoked for each active quoted include, in order, with the
/// definitions as they stand at that point so the included file can extend them.
pub fn preprocess(
    tokens: Vec<Token>,
    defines: &mut Defines,
    on_include: &mut dyn FnMut(&mut Defines, &IncludeDirective),
) -> Preprocessed {
    let mut out = Preprocessed::default();
    let mut stack: Vec<Conditional> = Vec::new();
    let mut last_line = 1;

    for token in tokens {
        let active = stack.last().is_none_or(|c| c.active);
        last_line = token.line();
        match &token.kind {
            TokenKind::Directive(text) => {
                let (name, rest) = split_directive(text);
                directive(
                    name,
                    rest,
                    token.line(),
                    active,
                    &mut stack,
                    defines,
                    &mut out,
                    on_include,
                );
            }
            TokenKind::Eof => {
                for open in stack.drain(..).rev() {
                    out.diagnostics.push(PassDiagnostic {
                        severity: Severity::Error,
                        message: "unterminated conditional directive".into(),
                        line: open.line,
                    });
                }
                out.tokens.push(token);
                break;
            }
            TokenKind::Error(message) if active => {
                out.diagnostics.push(PassDiagnostic {
                    severity: Severity::Error,
                    message: message.clone(),
                    line: token.line(),
                });
            }
            _ if active => out.tokens.push(token),
            _ => {}
        }
    }

    if !matches!(out.tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
        out.tokens.push(Token::new(
            TokenKind::Eof,
            crate::token::Span::new(0, 0, last_line, 1),
        ));
    }
    out
}

fn split_directive(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    (&text[..end], text[end..].trim())
}

#[allow(clippy::too_many_arguments)]
fn directive(
    name: &str,
    rest: &str,
    line: u32,
    active: bool,
    stack: &mut Vec<Conditional>,
    defines: &mut Defines,
    out: &mut Preprocessed,
    on_include: &mut dyn FnMut(&mut Defines, &IncludeDirective),
) {
    let mut problem = |severity, message: String| {
        out.diagnostics.push(PassDiagnostic {
            severity,
            message,
            line,
        });
    };
    match name {
        "if" | "ifdef" | "ifndef" => {
            let cond = active
                && match name {
                    "ifdef" => defines.contains_key(first_word(rest)),
                    "ifndef" => !defines.contains_key(first_word(rest)),
                    _ => condition(rest, defines),
                };
            stack.push(Conditional {
                parent_active: active,
                taken: cond,
                active: cond,
                seen_else: false,
                line,
            });
        }
        "elif" | "elifdef" | "elifndef" => {
            let Some(top) = stack.last_mut() else {
                problem(Severity::Error, format!("#{name} without #if"));
                return;
            };
            if top.seen_else {
                problem(Severity::Error, format!("#{name} after #else"));
            }
            let cond = top.parent_active
                && !top.taken
                && match name {
                    "elifdef" => defines.contains_key(first_word(rest)),
                    "elifndef" => !defines.contains_key(first_word(rest)),
                    _ => condition(rest, defines),
                };
            top.active = cond;
            top.taken |= cond;
        }
        "else" => {
            let Some(top) = stack.last_mut() else {
                problem(Severity::Error, "#else without #if".into());
                return;
            };
            if top.seen_else {
                problem(Severity::Error, "#else after #else".into());
            }
            top.seen_else = true;
            top.active = top.parent_active && !top.taken;
            top.taken = true;
        }
        "endif" => {
            if stack.pop().is_none() {
                problem(Severity::Error, "#endif without #if".into());
            }
        }
        _ if !active => {}
        "define" => {
            let ident_end = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let (macro_name, body) = rest.split_at(ident_end);
            if macro_name.is_empty() {
                problem(Severity::Error, "macro name missing in #define".into());
                return;
            }
            // function-like macros are remembered as defined, never expanded
            let body = if body.starts_with('(') { "" } else { body.trim() };
            defines.insert(macro_name.to_string(), body.to_string());
        }
        "undef" => {
            defines.remove(first_word(rest));
        }
        "include" | "include_next" | "import" => {
            if let Some(target) = rest.strip_prefix('"').and_then(|r| r.split('"').next()) {
                on_include(
                    defines,
                    &IncludeDirective {
                        target: target.to_string(),
                        line,
                    },
                );
            }
        }
        "error" => problem(Severity::Error, format!("#error {rest}")),
        "warning" => problem(Severity::Warning, format!("#warning {rest}")),
        _ => {}
    }
}

fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or_default()
}

/// Evaluates an `#if` condition. Undefined identifiers count as zero.
fn condition(text: &str, defines: &Defines) -> bool {
    let tokens = Lexer::tokenize_all(text);
    let mut resolved = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.is_ident("defined") {
            let (name, consumed) = match (tokens.get(i + 1), tokens.get(i + 2)) {
                (Some(open), Some(name)) if open.is_punct("(") => (name.spelling(), 4),
                (Some(name), _) => (name.spelling(), 2),
                _ => ("", 1),
            };
            let value = if defines.contains_key(name) { "1" } else { "0" };
            resolved.push(Token::new(TokenKind::Number(value.into()), token.span));
            i += consumed;
            continue;
        }
        if token.kind != TokenKind::Eof {
            resolved.push(token.clone());
        }
        i += 1;
    }
    let value = eval::evaluate(&resolved, &|name: &str| {
        let body = defines.get(name)?;
        if body.is_empty() {
            return Some(0);
        }
        let body_tokens = Lexer::tokenize_all(body);
        eval::evaluate(&body_tokens[..body_tokens.len() - 1], &|_: &str| Some(0))
    })
    .or_else(|| {
        // unknown identifiers are zero in #if
        eval::evaluate(&resolved, &|_: &str| Some(0))
    });
    value.is_some_and(|v| v != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        source: &str,
        defines: &mut Defines,
    ) -> (Vec<String>, Vec<IncludeDirective>, Preprocessed) {
        let mut includes = Vec::new();
        let mut record = |_: &mut Defines, inc: &IncludeDirective| includes.push(inc.clone());
        let out = preprocess(Lexer::tokenize_all(source), defines, &mut record);
        let words = out
            .tokens
            .iter()
            .filter(|t| t.kind.is_word())
            .map(|t| t.spelling().to_string())
            .collect();
        (words, includes, out)
    }

    #[test]
    fn if_zero_and_one() {
        let (words, _, _) =
            run("#if 0\na\n#else\nb\n#endif\n#if 1\nc\n#endif", &mut Defines::new());
        assert_eq!(words, vec!["b", "c"]);
    }

    #[test]
    fn ifdef_ifndef_and_defined() {
        let mut defines = Defines::new();
        defines.insert("WIN".into(), String::new());
        let (words, _, _) = run(
            "#ifdef WIN\na\n#endif\n#ifndef WIN\nb\n#endif\n#if defined(WIN) && !defined MAC\nc\n#endif",
            &mut defines,
        );
        assert_eq!(words, vec!["a", "c"]);
    }

    #[test]
    fn elif_chain_takes_first_true_branch() {
        let (words, _, _) = run(
            "#define LEVEL 2\n#if LEVEL == 1\na\n#elif LEVEL == 2\nb\n#elif 1\nc\n#else\nd\n#endif",
            &mut Defines::new(),
        );
        assert_eq!(words, vec!["b"]);
    }

    #[test]
    fn nested_inactive_regions_stay_inactive() {
        let (words, _, _) = run("#if 0\n#if 1\na\n#endif\n#else\nb\n#endif", &mut Defines::new());
        assert_eq!(words, vec!["b"]);
    }

    #[test]
    fn includes_only_in_active_regions() {
        let (_, includes, _) = run(
            "#include \"a.h\"\n#include <vector>\n#if 0\n#include \"b.h\"\n#endif",
            &mut Defines::new(),
        );
        assert_eq!(
            includes,
            vec![IncludeDirective {
                target: "a.h".into(),
                line: 1
            }]
        );
    }

    #[test]
    fn defines_and_undefs_update_set() {
        let mut defines = Defines::new();
        run("#define A 1\n#define F(x) x\n#define B\n#undef B", &mut defines);
        assert_eq!(defines.get("A").map(String::as_str), Some("1"));
        assert!(defines.contains_key("F"));
        assert!(!defines.contains_key("B"));
    }

    #[test]
    fn unterminated_conditional_is_an_error() {
        let (_, _, out) = run("#if 1\na\n", &mut Defines::new());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Error);
        assert_eq!(out.diagnostics[0].line, 1);
    }

    #[test]
    fn stray_endif_is_an_error() {
        let (_, _, out) = run("#endif\n", &mut Defines::new());
        assert_eq!(out.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn lexer_errors_surface() {
        let (_, _, out) = run("int x = \"open\n;", &mut Defines::new());
        assert!(out.diagnostics.iter().any(|d| d.message.contains("string")));
    }
}
