//! Annotation scanner.
//!
//! Turns the raw tokens of one annotation invocation into specifiers. The
//! scanner is a small stack machine: words are pushed, `=` is pushed as a
//! marker, and `,` or `)` reduce the stack into one specifier. Anything that
//! cannot form `key`, `key = value` is a [`TagSyntaxError`].
//!
//! [`TagSyntaxError`]: reflectgen_foundation::ErrorKind::TagSyntaxError

use reflectgen_foundation::{Error, Result, Specifier};
use reflectgen_source::{AnnotationToken, AnnotationTokenKind};

enum Slot {
    Word(String),
    Assign,
}

/// Scans a tag invocation such as `TPROPERTY(RTTRFuncName="hp", Category=3)`.
///
/// The first token is the macro name and is skipped. Quotes in values are
/// preserved; use [`reflectgen_foundation::strip_quotes`] to remove them.
///
/// # Errors
///
/// Returns a tag syntax error for malformed invocations.
pub fn scan_tag(tokens: &[AnnotationToken]) -> Result<Vec<Specifier>> {
    let mut specifiers = Vec::new();
    let mut stack: Vec<Slot> = Vec::new();
    let mut closed = false;

    for token in tokens.iter().skip(1) {
        if token.kind == AnnotationTokenKind::Comment {
            continue;
        }
        if closed {
            return Err(Error::tag_syntax(format!(
                "unexpected `{}` after the closing parenthesis",
                token.text
            )));
        }
        match token.kind {
            AnnotationTokenKind::Identifier
            | AnnotationTokenKind::Keyword
            | AnnotationTokenKind::Literal => stack.push(Slot::Word(token.text.clone())),
            AnnotationTokenKind::Comment => {}
            AnnotationTokenKind::Punctuation => match token.text.as_str() {
                "(" => {}
                "=" => {
                    if !matches!(stack.as_slice(), [Slot::Word(_)]) {
                        return Err(Error::tag_syntax("`=` must follow a single specifier name"));
                    }
                    stack.push(Slot::Assign);
                }
                "," => {
                    if stack.is_empty() {
                        return Err(Error::tag_syntax("empty specifier before `,`"));
                    }
                    specifiers.push(reduce(&mut stack)?);
                }
                ")" => {
                    if !stack.is_empty() {
                        specifiers.push(reduce(&mut stack)?);
                    }
                    closed = true;
                }
                other => {
                    return Err(Error::tag_syntax(format!("unexpected `{other}` in annotation")));
                }
            },
        }
    }

    if !stack.is_empty() {
        return Err(Error::tag_syntax("annotation is missing its closing parenthesis"));
    }
    Ok(specifiers)
}

fn reduce(stack: &mut Vec<Slot>) -> Result<Specifier> {
    let Some(Slot::Word(value)) = stack.pop() else {
        return Err(Error::tag_syntax("specifier is missing a value after `=`"));
    };
    let specifier = match stack.pop() {
        None => Specifier::flag(value),
        Some(Slot::Assign) => match stack.pop() {
            Some(Slot::Word(key)) => Specifier::new(key, value),
            _ => return Err(Error::tag_syntax("`=` without a specifier name")),
        },
        Some(Slot::Word(previous)) => {
            return Err(Error::tag_syntax(format!(
                "`{previous}` and `{value}` are not separated by `,` or `=`"
            )));
        }
    };
    if !stack.is_empty() {
        return Err(Error::tag_syntax("malformed specifier"));
    }
    Ok(specifier)
}

/// Scans the enable switch, e.g. `TRTTI_ENABLE(Base, ns::Other)`, into the
/// base names it lists.
///
/// # Errors
///
/// Returns a tag syntax error for anything other than a comma-separated list
/// of (possibly qualified, possibly templated) type names.
pub fn scan_switch(tokens: &[AnnotationToken]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut opened = false;

    for token in tokens.iter().skip(1) {
        let text = token.text.as_str();
        match token.kind {
            AnnotationTokenKind::Comment => {}
            AnnotationTokenKind::Punctuation => match text {
                "(" if !opened => opened = true,
                "," | ")" if depth == 0 => {
                    let name = current.trim();
                    if name.is_empty() && (text == "," || !names.is_empty()) {
                        return Err(Error::tag_syntax("empty base class name in enable switch"));
                    }
                    if !name.is_empty() {
                        names.push(name.to_string());
                    }
                    current.clear();
                    if text == ")" {
                        return Ok(names);
                    }
                }
                "<" | "(" => {
                    depth += 1;
                    current.push_str(text);
                }
                ">" | ")" => {
                    depth -= 1;
                    current.push_str(text);
                }
                ">>" => {
                    depth -= 2;
                    current.push_str(text);
                }
                "," => current.push_str(", "),
                "::" | "*" | "&" => current.push_str(text),
                other => {
                    return Err(Error::tag_syntax(format!(
                        "unexpected `{other}` in enable switch"
                    )));
                }
            },
            _ => {
                if current.ends_with(|c: char| c.is_alphanumeric() || c == '_') {
                    current.push(' ');
                }
                current.push_str(text);
            }
        }
    }

    if opened {
        return Err(Error::tag_syntax("enable switch is missing its closing parenthesis"));
    }
    Ok(names)
}
