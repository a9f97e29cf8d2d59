//! Annotation specifiers.

use std::fmt;

/// One `name[=value]` pair parsed out of an annotation invocation.
///
/// The value keeps its quotes when it was written as a string literal; an empty
/// value means no `=` was given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Specifier {
    /// Specifier key.
    pub name: String,
    /// Raw value, possibly empty.
    pub value: String,
}

impl Specifier {
    /// Creates a specifier with a value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a bare flag specifier.
    #[must_use]
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    /// Returns true if no value was given.
    #[must_use]
    pub fn is_flag(&self) -> bool {
        self.value.is_empty()
    }

    /// Returns the value with one pair of surrounding double quotes removed.
    #[must_use]
    pub fn unquoted_value(&self) -> &str {
        strip_quotes(&self.value)
    }

    /// Returns true if the name starts with `prefix` (case-insensitive).
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.name.len() >= prefix.len()
            && self.name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }
}

/// Removes one pair of surrounding double quotes, if present.
#[must_use]
pub fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Finds the first specifier named `name`.
#[must_use]
pub fn find<'a>(specifiers: &'a [Specifier], name: &str) -> Option<&'a Specifier> {
    specifiers.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_quotes_only_strips_pairs() {
        assert_eq!(strip_quotes("\"pos\""), "pos");
        assert_eq!(strip_quotes("pos"), "pos");
        assert_eq!(strip_quotes("\"pos"), "\"pos");
    }

    #[test]
    fn prefix_is_case_insensitive() {
        assert!(Specifier::flag("RTTRFuncName").has_prefix("RTTR"));
        assert!(Specifier::flag("rttrFuncName").has_prefix("RTTR"));
        assert!(!Specifier::flag("RTT").has_prefix("RTTR"));
    }

    #[test]
    fn display() {
        assert_eq!(Specifier::new("a", "1").to_string(), "a=1");
        assert_eq!(Specifier::flag("b").to_string(), "b");
    }

    #[test]
    fn find_first() {
        let specs = vec![Specifier::new("a", "1"), Specifier::new("a", "2")];
        assert_eq!(find(&specs, "a").map(|s| s.value.as_str()), Some("1"));
        assert!(find(&specs, "b").is_none());
    }
}
