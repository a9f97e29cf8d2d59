//! Integration tests for Diagnostics and Specifiers

use reflectgen_foundation::{
    Diagnostic, DiagnosticCode, Diagnostics, Error, ErrorContext, Severity, Specifier,
    strip_quotes,
};

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn diagnostic_from_error_carries_location_and_frame() {
    let err = Error::name_conflict("hp").with_context(
        ErrorContext::new()
            .with_source("include/Actor.h")
            .with_line(7)
            .with_frame("game::Actor"),
    );
    let diagnostic = Diagnostic::from(&err);
    assert_eq!(diagnostic.code, DiagnosticCode::FunctionNameConflict);
    assert_eq!(diagnostic.line, Some(7));
    assert!(diagnostic.message.ends_with("(in game::Actor)"));

    let shown = diagnostic.to_string();
    assert!(shown.starts_with("include/Actor.h:7: "));
    assert!(shown.contains("FunctionNameConflict"));
}

#[test]
fn diagnostics_count_by_severity() {
    let mut diagnostics = Diagnostics::new();
    assert!(diagnostics.is_empty());

    diagnostics.record(&Error::tag_syntax("bad"));
    diagnostics.record(&Error::parse_failed(std::path::Path::new("x.cpp"), "gone"));
    diagnostics.push(Diagnostic::new(
        DiagnosticCode::CompileWarning,
        Severity::Warning,
        "unused",
    ));

    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.error_count(), 2);
    assert_eq!(diagnostics.warning_count(), 1);
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.with_code(DiagnosticCode::TagSyntaxError).count(), 1);
}

#[test]
fn warnings_alone_are_not_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(
        Diagnostic::new(DiagnosticCode::CompileWarning, Severity::Warning, "unused").at("a.h", 1),
    );
    assert!(!diagnostics.has_errors());
    assert!(!diagnostics.as_slice()[0].is_error());
}

// =============================================================================
// Specifiers
// =============================================================================

#[test]
fn specifier_prefix_is_case_insensitive() {
    let spec = Specifier::new("RttrFuncName", "\"hp\"");
    assert!(spec.has_prefix("RTTR"));
    assert!(!spec.has_prefix("RTTRFuncNameLonger"));
    assert_eq!(spec.unquoted_value(), "hp");
    assert_eq!(spec.to_string(), "RttrFuncName=\"hp\"");
}

#[test]
fn flags_have_no_value() {
    let flag = Specifier::flag("Tweakable");
    assert!(flag.is_flag());
    assert_eq!(flag.to_string(), "Tweakable");
    assert_eq!(strip_quotes("\"unterminated"), "\"unterminated");
}
