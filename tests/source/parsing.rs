//! Integration tests for header parsing

use reflectgen_source::{Access, DeclKind, FunctionRole, parse_source};

const ACTOR_H: &str = r#"#pragma once
namespace game {
TCLASS(Category="Gameplay")
class Actor : public Entity {
    TRTTI_ENABLE(Entity)
public:
    Actor();
    TFUNCTION()
    void tick(float dt);
    TPROPERTY()
    int health = 100;
private:
    float speed;
};
TENUM()
enum class State { Idle, Walking = 4, Running };
}
"#;

fn function(decl: &reflectgen_source::Decl) -> &reflectgen_source::FunctionDecl {
    match &decl.kind {
        DeclKind::Function(f) => f,
        other => panic!("function expected, got {}", other.name()),
    }
}

#[test]
fn parses_a_reflected_header() {
    let parsed = parse_source("Actor.h", ACTOR_H);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

    let game = &parsed.declarations[0];
    assert_eq!(game.name, "game");
    assert_eq!(game.kind, DeclKind::Namespace);

    let actor = &game.children[0];
    assert_eq!(actor.name, "Actor");
    assert_eq!(actor.location.start_line, 4);
    let bases: Vec<_> = actor.bases().map(|b| b.name.as_str()).collect();
    assert_eq!(bases, vec!["Entity"]);

    let members: Vec<_> = actor
        .children
        .iter()
        .filter(|c| !matches!(c.kind, DeclKind::BaseSpecifier { .. }))
        .map(|c| (c.name.as_str(), c.access))
        .collect();
    assert_eq!(
        members,
        vec![
            ("Actor", Access::Public),
            ("tick", Access::Public),
            ("health", Access::Public),
            ("speed", Access::Private),
        ]
    );
}

#[test]
fn functions_carry_roles_and_parameters() {
    let parsed = parse_source("Actor.h", ACTOR_H);
    let actor = &parsed.declarations[0].children[0];
    let ctor = actor.children.iter().find(|c| c.name == "Actor").unwrap();
    assert_eq!(function(ctor).role, FunctionRole::Constructor);
    assert!(function(ctor).is_default_constructor());

    let tick = actor.children.iter().find(|c| c.name == "tick").unwrap();
    assert_eq!(function(tick).return_type, "void");
    assert_eq!(function(tick).signature("tick"), "tick(float)");
}

#[test]
fn enums_and_annotations() {
    let parsed = parse_source("Actor.h", ACTOR_H);
    let state = &parsed.declarations[0].children[1];
    assert!(matches!(state.kind, DeclKind::Enum { is_scoped: true }));
    let values: Vec<_> = state
        .children
        .iter()
        .map(|c| match c.kind {
            DeclKind::EnumConstant { value } => (c.name.as_str(), value),
            _ => panic!("constant expected"),
        })
        .collect();
    assert_eq!(values, vec![("Idle", 0), ("Walking", 4), ("Running", 5)]);

    let tags: Vec<_> = parsed
        .annotations
        .iter()
        .map(|a| (a.name.as_str(), a.line))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("TCLASS", 3),
            ("TRTTI_ENABLE", 5),
            ("TFUNCTION", 8),
            ("TPROPERTY", 10),
            ("TENUM", 15),
        ]
    );
}
