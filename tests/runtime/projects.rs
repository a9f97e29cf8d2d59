//! Integration tests for whole-project runs

use std::fs;
use std::path::{Path, PathBuf};

use reflectgen_model::DUMP_FILE_NAME;
use reflectgen_runtime::{Preprocessor, RunOptions};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

const ITEM_H: &str = r"#pragma once
TCLASS()
class Item {
    TRTTI_ENABLE()
public:
#ifdef WITH_WEIGHT
    TPROPERTY()
    float weight;
#endif
    TPROPERTY()
    int count;
};
";

fn project(settings: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Game/Include/Item.h", ITEM_H);
    write(dir.path(), "Game/Source/Item.cpp", "#include \"Item.h\"\n");
    write(dir.path(), "Config/ReflectionSettings.json", settings);
    dir
}

#[test]
fn settings_directory_drives_the_front_end() {
    let dir = project(
        r#"{
            "IncludePath": ["../Game/Include"],
            "MacroDefinition": ["WITH_WEIGHT"],
            "GeneratedPath": "Build/Generated"
        }"#,
    );
    let root = dir.path().join("Game");
    let options = RunOptions::new(&root).with_settings(dir.path().join("Config"));
    let summary = Preprocessor::run(&options).unwrap();
    assert_eq!(summary.exit_code(), 0, "{:?}", summary.diagnostics);

    let output = root.join("Build/Generated/Item.generated.cpp");
    assert_eq!(summary.files_written, vec![output.clone()]);
    let text = fs::read_to_string(output).unwrap();
    assert!(text.contains("#include \"Item.h\""));
    assert!(text.contains(".property(\"weight\", &Item::weight)"));
    assert!(text.contains(".property(\"count\", &Item::count)"));
}

#[test]
fn dump_mirrors_the_tree() {
    let dir = project(r#"{"IncludePath": ["../Game/Include"]}"#);
    let root = dir.path().join("Game");
    let options = RunOptions::new(&root).with_settings(dir.path().join("Config"));
    Preprocessor::run(&options).unwrap();

    let dump = fs::read_to_string(root.join("Generated").join(DUMP_FILE_NAME)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&dump).unwrap();
    let item = value["Children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["Name"] == "Item")
        .unwrap();
    assert_eq!(item["Type"], "Class");
    let members: Vec<_> = item["Children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["Name"].as_str().unwrap())
        .collect();
    assert!(members.contains(&"count"));
    assert!(!members.contains(&"weight"));
}

#[test]
fn rebuild_purges_stale_outputs() {
    let dir = project(r#"{"IncludePath": ["../Game/Include"]}"#);
    let root = dir.path().join("Game");
    let stale = write(&root, "Generated/Removed.generated.cpp", "// old\n");
    let options = RunOptions::new(&root)
        .with_settings(dir.path().join("Config/ReflectionSettings.json"))
        .with_rebuild(true);

    let summary = Preprocessor::run(&options).unwrap();
    assert!(!stale.exists());
    assert_eq!(summary.units_scanned, 1);
    assert_eq!(summary.files_written.len(), 1);
}

#[test]
fn generated_sources_are_not_units() {
    let dir = project(r#"{"IncludePath": ["../Game/Include"]}"#);
    let root = dir.path().join("Game");
    let options = RunOptions::new(&root).with_settings(dir.path().join("Config"));

    Preprocessor::run(&options).unwrap();
    let again = Preprocessor::run(&options.clone().with_rebuild(true)).unwrap();
    assert_eq!(again.units_scanned, 1);
}
