//! JSON debug dump of the declaration tree.
//!
//! The document mirrors the tree: one object per node with its kind-specific
//! fields and a `"Children"` array in name order.

use std::fs;
use std::path::Path;

use reflectgen_foundation::{Error, Result};
use serde_json::{Map, Value, json};

use crate::node::{DeclInfo, FunctionEntry, NodeData, NodeId, Record, TemplateInfo};
use crate::tree::DeclTree;

/// File name of the dump inside the output directory.
pub const DUMP_FILE_NAME: &str = "ast.json";

/// Renders the whole tree.
#[must_use]
pub fn dump_json(tree: &DeclTree) -> Value {
    node_json(tree, tree.root())
}

/// Writes the dump as pretty-printed JSON.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub fn write_dump(tree: &DeclTree, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(&dump_json(tree))
        .map_err(|e| Error::internal(format!("cannot serialize tree: {e}")))?;
    fs::write(path, text)?;
    Ok(())
}

fn node_json(tree: &DeclTree, id: NodeId) -> Value {
    let Some(node) = tree.get(id) else {
        return Value::Null;
    };
    let mut obj = Map::new();
    obj.insert("Name".into(), json!(node.name));
    obj.insert("Type".into(), json!(node.data.kind_name()));

    match &node.data {
        NodeData::Namespace => {}
        NodeData::Struct(record) | NodeData::Class(record) => record_fields(tree, record, &mut obj),
        NodeData::ClassTemplate { record, template } => {
            record_fields(tree, record, &mut obj);
            template_fields(template, &mut obj);
        }
        NodeData::Function(entry) => entry_fields(entry, &mut obj),
        NodeData::FunctionTemplate { entry, template } => {
            entry_fields(entry, &mut obj);
            template_fields(template, &mut obj);
        }
        NodeData::Overload(overload) => {
            decl_fields(&overload.decl, &mut obj);
            obj.insert("Source Name".into(), json!(overload.source_name));
            obj.insert("Is Const".into(), json!(overload.is_const));
            obj.insert("Is Getter".into(), json!(overload.is_getter));
            obj.insert("Return Type".into(), json!(overload.return_type));
            let params: Vec<Value> = overload
                .params
                .iter()
                .map(|p| json!({ "Type": p.ty, "Name": p.name, "Default": p.default_value }))
                .collect();
            obj.insert("Parameters".into(), Value::Array(params));
        }
        NodeData::Property(property) => {
            decl_fields(&property.decl, &mut obj);
            obj.insert("Data Type".into(), json!(property.data_type));
            obj.insert("Is Static".into(), json!(property.is_static));
        }
        NodeData::Enum(info) => {
            decl_fields(&info.decl, &mut obj);
            obj.insert("Is Scoped".into(), json!(info.is_scoped));
        }
        NodeData::EnumConstant { value } => {
            obj.insert("Value".into(), json!(value));
        }
    }

    let children: Vec<Value> = tree.children(id).map(|c| node_json(tree, c)).collect();
    obj.insert("Children".into(), Value::Array(children));
    Value::Object(obj)
}

fn decl_fields(decl: &DeclInfo, obj: &mut Map<String, Value>) {
    let specifiers: Vec<Value> = decl
        .specifiers
        .iter()
        .map(|s| json!({ "Name": s.name, "Value": s.value }))
        .collect();
    obj.insert("Specifiers".into(), Value::Array(specifiers));
    obj.insert(
        "File Info".into(),
        json!({
            "Path": decl.file_info.path.display().to_string(),
            "Start Line": decl.file_info.start_line,
            "End Line": decl.file_info.end_line,
        }),
    );
}

fn record_fields(tree: &DeclTree, record: &Record, obj: &mut Map<String, Value>) {
    decl_fields(&record.decl, obj);
    let bases: Vec<Value> = record
        .base_classes
        .iter()
        .map(|(name, &id)| {
            let resolved = tree.get(id).map(|_| tree.hierarchy_name(id));
            json!({ "Name": name, "Node": resolved })
        })
        .collect();
    obj.insert("Base Classes".into(), Value::Array(bases));
    obj.insert("RTTI Enabled".into(), json!(record.rtti_enabled));
    obj.insert("RTTI Base Classes".into(), json!(record.rtti_base_class_names));
    obj.insert("RTTI Friend".into(), json!(record.rtti_friend));
    obj.insert("Construct As Pointer".into(), json!(record.construct_as_pointer));
    obj.insert("Has Constructor".into(), json!(record.has_constructor));
    obj.insert("Has Default Constructor".into(), json!(record.has_default_constructor));
    obj.insert("Is Abstract".into(), json!(record.is_abstract));
}

fn entry_fields(entry: &FunctionEntry, obj: &mut Map<String, Value>) {
    decl_fields(&entry.decl, obj);
    obj.insert("Is Property".into(), json!(entry.is_property));
}

fn template_fields(template: &TemplateInfo, obj: &mut Map<String, Value>) {
    let params: Vec<Value> = template
        .params
        .iter()
        .map(|p| {
            json!({
                "Name": p.name,
                "Type": p.type_spelling,
                "Kind": p.kind.as_str(),
                "Default": p.default,
            })
        })
        .collect();
    obj.insert("Template Parameters".into(), Value::Array(params));
    obj.insert("Specialization".into(), json!(template.is_specialization));
    obj.insert("Actual Arguments".into(), json!(template.actual_args));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{EnumInfo, Overload, OverloadKind, Param};
    use reflectgen_foundation::{FileInfo, Specifier};

    fn sample() -> DeclTree {
        let mut tree = DeclTree::new();
        let root = tree.root();
        let decl = DeclInfo::new(
            vec![Specifier::new("Category", "\"ai\"")],
            FileInfo::new("a.h", 3, 9),
        );
        let base = tree
            .insert_child(root, "Base", NodeData::Class(Record::new(DeclInfo::default())))
            .unwrap();
        let mut record = Record::new(decl);
        record.base_classes.insert("Base".into(), base);
        let class = tree.insert_child(root, "Actor", NodeData::Class(record)).unwrap();
        let entry = tree
            .insert_child(class, "move", NodeData::Function(FunctionEntry::default()))
            .unwrap();
        let mut overload = Overload::new(OverloadKind::Instance, "move", "void");
        overload.params.push(Param::new("float", "dx"));
        tree.insert_child(entry, "move(float)", NodeData::Overload(overload))
            .unwrap();
        let colors = tree
            .insert_child(root, "Color", NodeData::Enum(EnumInfo::default()))
            .unwrap();
        tree.insert_child(colors, "Red", NodeData::EnumConstant { value: 2 })
            .unwrap();
        tree
    }

    #[test]
    fn mirrors_tree_shape() {
        let dump = dump_json(&sample());
        assert_eq!(dump["Type"], "Namespace");
        let children = dump["Children"].as_array().unwrap();
        let names: Vec<_> = children.iter().map(|c| c["Name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Actor", "Base", "Color"]);

        let actor = &children[0];
        assert_eq!(actor["RTTI Enabled"], true);
        assert_eq!(actor["Base Classes"][0]["Node"], "Base");
        assert_eq!(actor["File Info"]["Start Line"], 3);
        assert_eq!(actor["Specifiers"][0]["Value"], "\"ai\"");
        let overload = &actor["Children"][0]["Children"][0];
        assert_eq!(overload["Type"], "Instance Function");
        assert_eq!(overload["Parameters"][0]["Type"], "float");
        assert_eq!(children[2]["Children"][0]["Value"], 2);
    }

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DUMP_FILE_NAME);
        write_dump(&sample(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, dump_json(&sample()));
        assert!(text.contains('\n'));
    }
}
