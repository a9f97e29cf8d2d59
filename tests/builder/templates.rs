//! Integration tests for template instantiation across headers

use std::fs;

use reflectgen_builder::{BuildContext, Builder, UnitStatus, substitute};
use reflectgen_model::NodeData;
use reflectgen_source::UnitLoader;
use tempfile::TempDir;

const POOL_H: &str = r"#pragma once
namespace core {
TCLASS()
template <typename T, int N = 16>
class Pool {
    TRTTI_ENABLE()
public:
    TPROPERTY()
    T first;
};
}
";

const WORLD_H: &str = r#"#pragma once
#include "Pool.h"
TCLASS()
class World {
    TRTTI_ENABLE()
public:
    TPROPERTY()
    core::Pool<float> particles;
};
"#;

#[test]
fn member_types_instantiate_with_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Pool.h"), POOL_H).unwrap();
    fs::write(dir.path().join("World.h"), WORLD_H).unwrap();
    let unit = dir.path().join("World.cpp");
    fs::write(&unit, "#include \"World.h\"\n").unwrap();

    let parsed = UnitLoader::default().load(&unit).unwrap();
    let mut ctx = BuildContext::default();
    assert_eq!(Builder::new(&mut ctx).build(&parsed), UnitStatus::Built);
    assert!(ctx.diagnostics().is_empty(), "{:?}", ctx.diagnostics());

    let tree = ctx.tree();
    let instance = tree.lookup_qualified("core::Pool<float, 16>").unwrap();
    let info = tree.node(instance).unwrap().data.template().unwrap();
    assert!(info.is_specialization);
    assert_eq!(info.actual_args, vec!["float", "16"]);
    assert_eq!(
        ctx.templates()
            .instance("core::Pool", &["float".to_string(), "16".to_string()]),
        Some(instance)
    );

    let first = tree.child(instance, "first").unwrap();
    let NodeData::Property(property) = &tree.node(first).unwrap().data else {
        panic!("expected property");
    };
    assert_eq!(property.data_type, "float");

    let template = ctx.templates().class("core::Pool").unwrap();
    assert!(!tree.node(template).unwrap().data.template().unwrap().is_specialization);
}

#[test]
fn substitution_respects_identifier_boundaries() {
    let formals = vec!["T".to_string()];
    let actuals = vec!["int".to_string()];
    assert_eq!(
        substitute("std::vector<T> TT T_", &formals, &actuals),
        "std::vector<int> TT T_"
    );
}
