//! Integration tests for Error types
//!
//! Tests error construction, display, codes and severities.

use std::path::Path;

use reflectgen_foundation::{DiagnosticCode, Error, ErrorContext, ErrorKind, Severity};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_parse_failed() {
    let err = Error::parse_failed(Path::new("src/Actor.cpp"), "no such file");
    assert!(matches!(err.kind, ErrorKind::ParseFailed { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("Actor.cpp"));
    assert!(msg.contains("no such file"));
    assert_eq!(err.severity(), Severity::Fatal);
}

#[test]
fn error_invalid_property_count() {
    let err = Error::invalid_property_count("game::Actor::hp", 3);
    assert_eq!(err.code(), DiagnosticCode::InvalidPropertyFunctionCount);
    let msg = format!("{err}");
    assert!(msg.contains("game::Actor::hp"));
    assert!(msg.contains('3'));
}

#[test]
fn error_base_class_no_rtti() {
    let err = Error::base_class_no_rtti("B", "A");
    assert!(matches!(err.kind, ErrorKind::BaseClassNoRtti { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("base class A of B"));
}

#[test]
fn error_from_io() {
    let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
    assert_eq!(err.code(), DiagnosticCode::ParseFailed);
}

// =============================================================================
// Codes and Severities
// =============================================================================

#[test]
fn model_errors_drop_only_the_declaration() {
    let errors = [
        Error::tag_syntax("unbalanced"),
        Error::invalid_specifier("RTTRFuncName missing"),
        Error::name_conflict("hp"),
        Error::rtti_disabled("S"),
        Error::no_parent("ns::X"),
        Error::new(ErrorKind::NoDefaultConstructor("C".into())),
    ];
    for err in &errors {
        assert_eq!(err.severity(), Severity::Error, "{err}");
    }
}

#[test]
fn front_end_warnings_are_warnings() {
    let err = Error::new(ErrorKind::CompileWarning("unused".into()));
    assert_eq!(err.severity(), Severity::Warning);
    assert_eq!(err.code(), DiagnosticCode::CompileWarning);
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_at_sets_location() {
    let err = Error::rtti_disabled("S").at("a.h", 12);
    let ctx = err.context.unwrap();
    assert_eq!(ctx.source.as_deref(), Some(Path::new("a.h")));
    assert_eq!(ctx.line, Some(12));
}

#[test]
fn error_with_context_frames() {
    let err = Error::name_conflict("hp").with_context(
        ErrorContext::new()
            .with_source("a.h")
            .with_line(4)
            .with_frame("game::Actor"),
    );
    let ctx = err.context.as_ref().unwrap();
    assert_eq!(ctx.stack, vec!["game::Actor".to_string()]);
}
