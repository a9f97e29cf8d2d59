//! Integration tests for translation-unit loading

use std::fs;
use std::path::{Path, PathBuf};

use reflectgen_source::{DeclarationSource, LoaderConfig, UnitLoader};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn annotations_keep_their_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Include/Actor.h",
        "#pragma once\nTCLASS()\nclass Actor {\n    TRTTI_ENABLE()\n};\n",
    );
    let unit = write(
        dir.path(),
        "Source/Actor.cpp",
        "#include \"Actor.h\"\nTFUNCTION()\nvoid helper();\n",
    );
    let loader = UnitLoader::new(LoaderConfig::new().with_include_path(dir.path().join("Include")));
    let parsed = loader.load(&unit).unwrap();

    assert_eq!(parsed.unit_path(), unit.as_path());
    assert_eq!(parsed.files().len(), 2);
    let places: Vec<_> = parsed
        .annotations()
        .iter()
        .map(|a| (a.path.file_name().unwrap().to_str().unwrap(), a.line))
        .collect();
    assert_eq!(
        places,
        vec![("Actor.h", 2), ("Actor.h", 4), ("Actor.cpp", 2)]
    );
    let names: Vec<_> = parsed.declarations().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Actor", "helper"]);
}

#[test]
fn predefined_macros_select_branches() {
    let dir = TempDir::new().unwrap();
    let unit = write(
        dir.path(),
        "main.cpp",
        "#ifdef T3D_OS_WINDOWS\nint windows;\n#else\nint other;\n#endif\n",
    );
    let with = UnitLoader::new(LoaderConfig::new().with_define("T3D_OS_WINDOWS", "1"))
        .load(&unit)
        .unwrap();
    assert_eq!(with.declarations()[0].name, "windows");

    let without = UnitLoader::default().load(&unit).unwrap();
    assert_eq!(without.declarations()[0].name, "other");
}
