//! Integration tests for the settings document

use std::path::PathBuf;

use reflectgen_runtime::Settings;

#[test]
fn settings_round_trip_through_json() {
    let settings = Settings {
        include_path: vec![PathBuf::from("/opt/include")],
        macro_definition: vec!["DEBUG=1".into()],
        other_flags: vec!["-std=c++17".into()],
        generated_path: PathBuf::from("Out"),
        ..Settings::default()
    };
    let text = serde_json::to_string(&settings).unwrap();
    assert!(text.contains("\"IncludePath\""));
    assert!(text.contains("\"GeneratedPath\":\"Out\""));
    assert_eq!(Settings::from_json(&text).unwrap(), settings);
}

#[test]
fn empty_document_uses_defaults() {
    assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    assert!(Settings::default().front_end_args().is_empty());
}
