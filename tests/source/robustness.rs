//! Crash resistance of the header front end on truncated and malformed input

use proptest::prelude::*;
use reflectgen_foundation::Severity;
use reflectgen_source::parse_source;

const HEADER: &str = r#"#pragma once
namespace game {
TCLASS()
class Actor : public Entity {
    TRTTI_ENABLE(Entity)
public:
    Actor(int id, float scale = 1.0f);
    TFUNCTION()
    bool operator()(const std::map<int, std::vector<float>>& m) const;
    TPROPERTY(RTTRFuncName="speed")
    float getSpeed() const noexcept;
    template<typename T, int N = (1 << 2)>
    T convert(T (*fn)(int), decltype(N) n = {}) -> T;
};
TENUM()
enum class State : unsigned { Idle, Walking = 4, Running };
}
"#;

/// Fragments that show up in headers, glued together at random.
fn header_like() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("class "),
        Just("struct "),
        Just("enum "),
        Just("namespace "),
        Just("template<"),
        Just("operator"),
        Just("TCLASS()"),
        Just("TPROPERTY("),
        Just("A"),
        Just("int "),
        Just("::"),
        Just("("),
        Just(")"),
        Just("{"),
        Just("}"),
        Just("<"),
        Just(">"),
        Just(","),
        Just(";"),
        Just("="),
        Just("\n"),
        Just("#if 1\n"),
        Just("#endif\n"),
    ];
    prop::collection::vec(piece, 0..60).prop_map(|parts| parts.concat())
}

#[test]
fn unterminated_operator_call_is_an_error() {
    let parsed = parse_source("a.h", "int operator()(");
    assert!(parsed.declarations.is_empty());
    assert!(parsed.diagnostics.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn unterminated_constructor_is_an_error() {
    let parsed = parse_source("a.h", "class A { A(");
    assert!(parsed.diagnostics.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn every_prefix_of_a_header_parses() {
    for end in (0..=HEADER.len()).filter(|i| HEADER.is_char_boundary(*i)) {
        let _ = parse_source("a.h", &HEADER[..end]);
    }
}

proptest! {
    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,200}") {
        let _ = parse_source("a.h", &text);
    }

    #[test]
    fn header_like_text_never_panics(text in header_like()) {
        let _ = parse_source("a.h", &text);
    }
}
