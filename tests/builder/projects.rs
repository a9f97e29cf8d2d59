//! Integration tests for building several units of one project

use std::fs;
use std::path::{Path, PathBuf};

use reflectgen_builder::{BuildContext, Builder, BuilderConfig, UnitStatus};
use reflectgen_foundation::DiagnosticCode;
use reflectgen_source::{LoaderConfig, UnitLoader};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

const ENTITY_H: &str = r"#pragma once
namespace game {
TCLASS()
class Entity {
    TRTTI_ENABLE()
public:
    TFUNCTION()
    int id() const;
};
}
";

const PLAYER_H: &str = r#"#pragma once
#include "Entity.h"
namespace game {
TCLASS()
class Player : public Entity {
    TRTTI_ENABLE(Entity)
public:
    TPROPERTY(RTTRFuncName="score")
    int getScore() const;
    TPROPERTY(RTTRFuncName="score")
    void setScore(int v);
};
}
"#;

struct Project {
    dir: TempDir,
    units: Vec<PathBuf>,
}

fn project() -> Project {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Project/Include/Entity.h", ENTITY_H);
    write(dir.path(), "Project/Include/Player.h", PLAYER_H);
    let units = vec![
        write(dir.path(), "Project/Source/Entity.cpp", "#include \"Entity.h\"\n"),
        write(dir.path(), "Project/Source/Player.cpp", "#include \"Player.h\"\n"),
    ];
    Project { dir, units }
}

fn build_all(project: &Project, config: BuilderConfig) -> BuildContext {
    let loader = UnitLoader::new(
        LoaderConfig::new().with_include_path(project.dir.path().join("Project/Include")),
    );
    let mut ctx = BuildContext::new(config);
    for unit in &project.units {
        let parsed = loader.load(unit).unwrap();
        assert_eq!(Builder::new(&mut ctx).build(&parsed), UnitStatus::Built);
    }
    ctx
}

#[test]
fn shared_headers_build_once() {
    let project = project();
    let ctx = build_all(&project, BuilderConfig::new());
    assert!(ctx.diagnostics().is_empty(), "{:?}", ctx.diagnostics());

    let tree = ctx.tree();
    let entity = tree.lookup_qualified("game::Entity").unwrap();
    let player = tree.lookup_qualified("game::Player").unwrap();
    let record = tree.node(player).unwrap().data.record().unwrap();
    assert_eq!(record.base_classes.get("game::Entity"), Some(&entity));

    let score = tree.lookup_qualified("game::Player::score").unwrap();
    assert!(tree.node(score).unwrap().data.entry().unwrap().is_property);
    assert_eq!(tree.children(score).count(), 2);

    let include = project.dir.path().join("Project/Include");
    let files = ctx.source_files();
    assert!(files[&include.join("Entity.h")].contains(&entity));
    assert!(files[&include.join("Player.h")].contains(&player));
    assert!(!files[&include.join("Player.h")].contains(&entity));
}

#[test]
fn headers_outside_the_project_are_not_generated() {
    let project = project();
    let root = project.dir.path().join("Project/Source");
    let ctx = build_all(&project, BuilderConfig::new().with_project_root(&root));

    assert!(ctx.tree().lookup_qualified("game::Player").is_some());
    assert!(ctx.source_files().keys().all(|p| p.starts_with(&root)));
}

#[test]
fn errors_in_one_unit_do_not_stop_the_next() {
    let project = project();
    write(
        project.dir.path(),
        "Project/Include/Entity.h",
        &ENTITY_H.replace("TRTTI_ENABLE()", ""),
    );
    let ctx = build_all(&project, BuilderConfig::new());

    let codes: Vec<_> = ctx.diagnostics().iter().map(|d| d.code).collect();
    assert!(codes.contains(&DiagnosticCode::BaseClassNoRtti), "{codes:?}");
    assert!(ctx.tree().lookup_qualified("game::Player").is_none());
}
