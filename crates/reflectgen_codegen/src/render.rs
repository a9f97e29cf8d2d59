//! Per-source-file rendering and output.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use reflectgen_foundation::{Error, Result};
use reflectgen_model::{DeclTree, NodeData, NodeId};
use tracing::{debug, info};

use crate::config::{GeneratorConfig, output_file_name};
use crate::emit::Emitter;

const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "inl"];

/// One rendered registration file.
#[derive(Debug)]
pub struct RenderedFile {
    /// Output file name.
    pub name: String,
    /// File contents.
    pub text: String,
    /// Errors of items that were left out.
    pub errors: Vec<Error>,
}

/// Outcome of [`write_outputs`].
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Files written, in order.
    pub written: Vec<PathBuf>,
    /// Errors of items that were left out.
    pub errors: Vec<Error>,
}

/// Renders the registration file for the nodes declared in `source`.
///
/// # Errors
///
/// Fails if one of `ids` is not a live node.
pub fn render_file(
    tree: &DeclTree,
    source: &Path,
    ids: &BTreeSet<NodeId>,
    config: &GeneratorConfig,
) -> Result<RenderedFile> {
    let mut emitter = Emitter::new(tree, config);
    let mut body = String::new();
    let mut namespaces = BTreeSet::new();

    for &id in ids {
        let node = tree.node(id)?;
        let Some(item) = emitter.emit_item(id) else {
            continue;
        };
        if let Some(parent) = node.parent.filter(|&p| p != tree.root()) {
            let is_namespace = tree
                .get(parent)
                .is_some_and(|n| matches!(n.data, NodeData::Namespace));
            let namespace = tree.hierarchy_name(parent);
            if is_namespace && !namespace.is_empty() && namespaces.insert(namespace.clone()) {
                let _ = write!(body, "\n\tusing namespace {namespace};\n");
            }
        }
        body.push_str(&item);
    }

    let mut text = String::new();
    for line in &config.banner {
        let _ = writeln!(text, "// {line}");
    }
    text.push_str("\n#include <rttr/registration>\n");
    for include in includes(tree, source, ids, config) {
        let _ = writeln!(text, "#include \"{include}\"");
    }
    text.push_str("\nRTTR_REGISTRATION\n{\n\tusing namespace rttr;\n");
    text.push_str(&body);
    text.push_str("}\n");

    Ok(RenderedFile {
        name: output_file_name(source),
        text,
        errors: emitter.into_errors(),
    })
}

/// Headers the generated file must include: `source` itself and the
/// declaring headers of template instances it registers.
fn includes(
    tree: &DeclTree,
    source: &Path,
    ids: &BTreeSet<NodeId>,
    config: &GeneratorConfig,
) -> Vec<String> {
    let declaring = ids.iter().flat_map(|&id| tree.walk(id)).filter_map(|n| {
        tree.get(n)
            .and_then(|node| node.data.decl())
            .map(|decl| decl.file_info.path.as_path())
    });
    let mut seen = BTreeSet::new();
    std::iter::once(source)
        .chain(declaring)
        .filter(|path| is_header(path))
        .map(|path| config.include_spelling(path))
        .filter(|spelling| seen.insert(spelling.clone()))
        .collect()
}

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HEADER_EXTENSIONS.iter().any(|h| h.eq_ignore_ascii_case(e)))
}

/// Writes one registration file per source file into `dir`.
///
/// Source files sharing a stem share one output file. Entries without nodes
/// are skipped.
///
/// # Errors
///
/// Fails on a dangling node handle or when a file cannot be written.
pub fn write_outputs(
    tree: &DeclTree,
    source_files: &BTreeMap<PathBuf, BTreeSet<NodeId>>,
    config: &GeneratorConfig,
    dir: &Path,
) -> Result<GenerationReport> {
    let mut grouped: BTreeMap<String, (&Path, BTreeSet<NodeId>)> = BTreeMap::new();
    for (source, ids) in source_files {
        if ids.is_empty() {
            continue;
        }
        grouped
            .entry(output_file_name(source))
            .or_insert_with(|| (source.as_path(), BTreeSet::new()))
            .1
            .extend(ids.iter().copied());
    }

    fs::create_dir_all(dir)?;
    let mut report = GenerationReport::default();
    for (name, (source, ids)) in grouped {
        let rendered = render_file(tree, source, &ids, config)?;
        let path = dir.join(&name);
        fs::write(&path, &rendered.text)?;
        info!(file = %path.display(), items = ids.len(), "wrote registration file");
        if !rendered.errors.is_empty() {
            debug!(file = %path.display(), left_out = rendered.errors.len(), "items left out");
        }
        report.errors.extend(rendered.errors);
        report.written.push(path);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflectgen_foundation::{DiagnosticCode, FileInfo};
    use reflectgen_model::{
        DeclInfo, EnumInfo, FunctionEntry, Overload, OverloadKind, Record, TemplateInfo,
    };

    struct Fixture {
        tree: DeclTree,
        files: BTreeMap<PathBuf, BTreeSet<NodeId>>,
    }

    fn fixture() -> Fixture {
        let mut tree = DeclTree::new();
        let root = tree.root();
        let game = tree.insert_child(root, "game", NodeData::Namespace).unwrap();
        let actor = tree
            .insert_child(
                game,
                "Actor",
                NodeData::Class(Record::new(DeclInfo::new(
                    Vec::new(),
                    FileInfo::new("/proj/include/game/Actor.h", 3, 20),
                ))),
            )
            .unwrap();
        let state = tree
            .insert_child(
                game,
                "State",
                NodeData::Enum(EnumInfo {
                    decl: DeclInfo::new(
                        Vec::new(),
                        FileInfo::new("/proj/include/game/Actor.h", 1, 1),
                    ),
                    is_scoped: true,
                }),
            )
            .unwrap();
        tree.insert_child(state, "Idle", NodeData::EnumConstant { value: 0 })
            .unwrap();
        let pool = tree
            .insert_child(
                root,
                "Pool<int>",
                NodeData::ClassTemplate {
                    record: Record::new(DeclInfo::new(
                        Vec::new(),
                        FileInfo::new("/proj/include/core/Pool.h", 1, 9),
                    )),
                    template: TemplateInfo {
                        is_specialization: true,
                        actual_args: vec!["int".into()],
                        ..TemplateInfo::default()
                    },
                },
            )
            .unwrap();

        let mut files = BTreeMap::new();
        files.insert(
            PathBuf::from("/proj/include/game/Actor.h"),
            BTreeSet::from([actor, state, pool]),
        );
        Fixture { tree, files }
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig::new().with_include_paths(["/proj/include"])
    }

    #[test]
    fn file_layout() {
        let f = fixture();
        let (source, ids) = f.files.iter().next().unwrap();
        let rendered = render_file(&f.tree, source, ids, &config()).unwrap();
        assert_eq!(rendered.name, "Actor.generated.cpp");
        assert!(rendered.errors.is_empty());

        let text = rendered.text;
        assert!(text.starts_with("// Generated code exported from reflectgen.\n"));
        assert!(text.contains(
            "\n#include <rttr/registration>\n#include \"game/Actor.h\"\n#include \"core/Pool.h\"\n\nRTTR_REGISTRATION\n{\n\tusing namespace rttr;\n"
        ));
        assert_eq!(text.matches("using namespace game;").count(), 1);
        assert!(text.contains("registration::class_<game::Actor>(\"game::Actor\")"));
        assert!(text.contains("registration::enumeration<game::State>(\"game::State\")"));
        assert!(text.contains("registration::class_<Pool<int>>(\"Pool<int>\")"));
        assert!(text.ends_with(";\n}\n"));
    }

    #[test]
    fn sources_are_not_included() {
        let f = fixture();
        let ids = f.files.values().next().unwrap();
        let rendered =
            render_file(&f.tree, Path::new("/proj/src/main.cpp"), ids, &config()).unwrap();
        assert_eq!(rendered.name, "main.generated.cpp");
        assert!(!rendered.text.contains("main.cpp\""));
        assert!(rendered.text.contains("#include \"game/Actor.h\""));
    }

    #[test]
    fn bad_items_are_reported_and_left_out() {
        let mut f = fixture();
        let root = f.tree.root();
        let hp = f
            .tree
            .insert_child(
                root,
                "hp",
                NodeData::Function(FunctionEntry {
                    is_property: true,
                    decl: DeclInfo::default(),
                }),
            )
            .unwrap();
        f.tree
            .insert_child(
                hp,
                "setHp(int)",
                NodeData::Overload(Overload::new(OverloadKind::Free, "setHp", "void")),
            )
            .unwrap();
        let (source, ids) = f.files.iter_mut().next().unwrap();
        ids.insert(hp);
        let rendered = render_file(&f.tree, source, ids, &config()).unwrap();
        assert_eq!(rendered.errors.len(), 1);
        assert_eq!(rendered.errors[0].code(), DiagnosticCode::InvalidPropertyFunctionCount);
        assert!(!rendered.text.contains("\"hp\""));
    }

    #[test]
    fn writes_one_file_per_stem() {
        let f = fixture();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Generated");
        let mut files = f.files.clone();
        files.insert(PathBuf::from("/proj/src/empty.cpp"), BTreeSet::new());

        let report = write_outputs(&f.tree, &files, &config(), &out).unwrap();
        assert_eq!(report.written, vec![out.join("Actor.generated.cpp")]);
        assert!(report.errors.is_empty());
        let text = fs::read_to_string(out.join("Actor.generated.cpp")).unwrap();
        assert!(text.contains("RTTR_REGISTRATION"));
        assert!(!out.join("empty.generated.cpp").exists());
    }
}
