//! Registration statements per node kind.
//!
//! Records become a `registration::class_<T>` statement whose reflected
//! members are chained onto it (`.method`, `.property`, `.constructor`,
//! `.enumeration`). Items at namespace level become standalone
//! `registration::` statements. Every item may carry one parenthesized
//! argument block merging its constructor policy, default arguments and
//! metadata.

use std::fmt::Write;

use reflectgen_foundation::{Error, Result};
use reflectgen_model::{
    DeclInfo, DeclTree, EnumInfo, FunctionEntry, NodeData, NodeId, Overload, OverloadKind, Param,
    Property, Record,
};
use tracing::{debug, trace};

use crate::config::{GeneratorConfig, SmartPointer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    /// Chained onto the enclosing record's statement.
    Chained,
    /// A standalone statement at namespace level.
    Global,
}

/// Emits registration code for nodes of one tree.
///
/// Failures of individual items are kept and the item is left out, so one
/// malformed property does not cost the rest of its class.
pub struct Emitter<'a> {
    tree: &'a DeclTree,
    config: &'a GeneratorConfig,
    errors: Vec<Error>,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter.
    #[must_use]
    pub fn new(tree: &'a DeclTree, config: &'a GeneratorConfig) -> Self {
        Self {
            tree,
            config,
            errors: Vec::new(),
        }
    }

    /// Errors of items left out so far.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Consumes the emitter, returning the errors of items left out.
    #[must_use]
    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    /// Emits the registration of `id`, recording its error instead of
    /// returning it. `None` means the node has nothing to register.
    pub fn emit_item(&mut self, id: NodeId) -> Option<String> {
        match self.emit(id) {
            Ok(text) => text,
            Err(err) => {
                debug!(node = %self.tree.describe(id), error = %err, "item left out");
                self.errors.push(err);
                None
            }
        }
    }

    /// Emits the registration of `id`.
    ///
    /// # Errors
    ///
    /// Fails for a dangling handle, for a bare overload or enum constant, and
    /// for a property entry without exactly one getter and at most one setter.
    pub fn emit(&mut self, id: NodeId) -> Result<Option<String>> {
        let tree = self.tree;
        let node = tree.node(id)?;
        let placement = match node.parent.and_then(|p| tree.get(p)) {
            Some(parent) if parent.data.is_record() => Placement::Chained,
            _ => Placement::Global,
        };
        trace!(node = %self.tree.describe(id), ?placement, "emit");

        match &node.data {
            NodeData::Namespace => Ok(None),
            NodeData::Struct(record) | NodeData::Class(record) => self.record(id, record).map(Some),
            NodeData::ClassTemplate { record, template } => {
                if template.is_specialization {
                    self.record(id, record).map(Some)
                } else {
                    Ok(None)
                }
            }
            NodeData::Function(entry) => self.function(id, entry, placement),
            NodeData::FunctionTemplate { entry, template } => {
                if template.is_specialization {
                    self.function(id, entry, placement)
                } else {
                    Ok(None)
                }
            }
            NodeData::Property(property) => Ok(Some(self.property(id, property, placement))),
            NodeData::Enum(info) => Ok(Some(self.enumeration(id, info, placement))),
            NodeData::Overload(_) | NodeData::EnumConstant { .. } => Err(Error::internal(format!(
                "{} cannot be registered on its own",
                self.tree.describe(id)
            ))),
        }
    }

    fn record(&mut self, id: NodeId, record: &Record) -> Result<String> {
        let name = self.tree.hierarchy_name(id);
        let mut out = String::new();
        let _ = write!(out, "\n\t// ---- register class {name}");
        if !record.base_classes.is_empty() {
            let bases: Vec<&str> = record.base_classes.keys().map(String::as_str).collect();
            let _ = write!(out, " (base classes: {})", bases.join(", "));
        }
        let _ = write!(out, "\n\tregistration::class_<{name}>(\"{name}\")");

        let members: Vec<NodeId> = self
            .tree
            .children(id)
            .filter(|&c| {
                self.tree.get(c).is_some_and(|n| {
                    matches!(
                        n.data,
                        NodeData::Function(_)
                            | NodeData::FunctionTemplate { .. }
                            | NodeData::Property(_)
                            | NodeData::Enum(_)
                    )
                })
            })
            .collect();
        for member in members {
            if let Some(text) = self.emit_item(member) {
                out.push('\n');
                out.push_str(&text);
            }
        }

        out.push_str(&arguments_block(&self.metadata(&record.decl)));
        out.push_str(";\n");

        if let Some(smart) = &self.config.smart_pointer {
            if self.tree.derives_from(id, &smart.base) {
                out.push_str(&wrapper_registration(&name, smart));
            }
        }
        Ok(out)
    }

    fn function(
        &self,
        id: NodeId,
        entry: &FunctionEntry,
        placement: Placement,
    ) -> Result<Option<String>> {
        let node = self.tree.node(id)?;
        let owner = self.owner_name(id);
        let overloads = self.overloads(id);

        if entry.is_property {
            let item = self.accessors(id, &node.name, &owner, &overloads)?;
            return Ok(Some(place(vec![item], placement)));
        }

        let methods: Vec<&Overload> = overloads
            .iter()
            .copied()
            .filter(|o| {
                matches!(
                    o.kind,
                    OverloadKind::Static | OverloadKind::Instance | OverloadKind::Free
                )
            })
            .collect();
        let target = qualify(&owner, &node.name);
        let mut items = Vec::new();

        for overload in &methods {
            let pointer = if methods.len() == 1 {
                format!("&{target}")
            } else {
                format!("select_overload<{}>(&{target})", signature(overload))
            };
            let mut arguments = Vec::new();
            arguments.extend(default_arguments(&overload.params));
            arguments.extend(self.metadata(&overload.decl));
            items.push(format!(
                "method(\"{}\", {pointer}){}",
                node.name,
                arguments_block(&arguments)
            ));
        }

        let as_pointer = node
            .parent
            .and_then(|p| self.tree.get(p))
            .and_then(|p| p.data.record())
            .is_some_and(|r| r.construct_as_pointer);
        for overload in &overloads {
            let OverloadKind::Constructor { is_normal } = overload.kind else {
                continue;
            };
            let head = if is_normal {
                format!("constructor<{}>()", overload.param_types())
            } else {
                format!("constructor(&{})", qualify(&owner, &overload.source_name))
            };
            let policy = if as_pointer {
                "policy::ctor::as_raw_ptr"
            } else {
                "policy::ctor::as_object"
            };
            let mut arguments = vec![policy.to_string()];
            arguments.extend(default_arguments(&overload.params));
            arguments.extend(self.metadata(&overload.decl));
            items.push(format!("{head}{}", arguments_block(&arguments)));
        }

        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(place(items, placement)))
    }

    fn accessors(
        &self,
        id: NodeId,
        name: &str,
        owner: &str,
        overloads: &[&Overload],
    ) -> Result<String> {
        let getters: Vec<&Overload> = overloads.iter().copied().filter(|o| o.is_getter).collect();
        let setters: Vec<&Overload> = overloads.iter().copied().filter(|o| !o.is_getter).collect();
        let accessor = |o: &Overload| {
            format!(
                "select_overload<{}>(&{})",
                signature(o),
                qualify(owner, &o.source_name)
            )
        };

        let (head, getter) = match (getters.as_slice(), setters.as_slice()) {
            ([getter], []) => (
                format!("property_readonly(\"{name}\", {})", accessor(getter)),
                *getter,
            ),
            ([getter], [setter]) => (
                format!(
                    "property(\"{name}\", {}, {})",
                    accessor(getter),
                    accessor(setter)
                ),
                *getter,
            ),
            _ => {
                let mut err =
                    Error::invalid_property_count(self.tree.hierarchy_name(id), overloads.len());
                if let Some(first) = overloads.first() {
                    let info = &first.decl.file_info;
                    err = err.at(&info.path, info.start_line);
                }
                return Err(err);
            }
        };
        Ok(format!("{head}{}", arguments_block(&self.metadata(&getter.decl))))
    }

    fn property(&self, id: NodeId, property: &Property, placement: Placement) -> String {
        let qualified = self.tree.hierarchy_name(id);
        let shown = match placement {
            Placement::Chained => self.tree.get(id).map_or(qualified.as_str(), |n| n.name.as_str()),
            Placement::Global => qualified.as_str(),
        };
        let item = format!(
            "property(\"{shown}\", &{qualified}){}",
            arguments_block(&self.metadata(&property.decl))
        );
        place(vec![item], placement)
    }

    fn enumeration(&self, id: NodeId, info: &EnumInfo, placement: Placement) -> String {
        let name = self.tree.hierarchy_name(id);
        let values: Vec<String> = self
            .tree
            .children(id)
            .filter_map(|c| {
                let constant = self.tree.get(c)?;
                matches!(constant.data, NodeData::EnumConstant { .. })
                    .then(|| format!("\t\t\tvalue(\"{0}\", {name}::{0})", constant.name))
            })
            .collect();
        let mut item = format!("enumeration<{name}>(\"{name}\")\n\t\t(\n");
        if !values.is_empty() {
            item.push_str(&values.join(",\n"));
            item.push('\n');
        }
        item.push_str("\t\t)");
        item.push_str(&arguments_block(&self.metadata(&info.decl)));
        place(vec![item], placement)
    }

    fn overloads(&self, id: NodeId) -> Vec<&'a Overload> {
        let tree = self.tree;
        tree.children(id)
            .filter_map(|c| match &tree.get(c)?.data {
                NodeData::Overload(overload) => Some(overload),
                _ => None,
            })
            .collect()
    }

    fn owner_name(&self, id: NodeId) -> String {
        self.tree
            .get(id)
            .and_then(|n| n.parent)
            .map(|p| self.tree.hierarchy_name(p))
            .unwrap_or_default()
    }

    /// `metadata(...)` entries for the non-reserved specifiers of `decl`.
    fn metadata(&self, decl: &DeclInfo) -> Vec<String> {
        decl.specifiers
            .iter()
            .filter(|s| !s.has_prefix(&self.config.reserved_prefix))
            .map(|s| {
                let value = if s.is_flag() { "true" } else { s.value.as_str() };
                format!("metadata(\"{}\", {value})", s.name)
            })
            .collect()
    }
}

/// Emits the registration of one node.
///
/// # Errors
///
/// Fails if the node, or any member chained onto it, cannot be registered.
pub fn generate_node(tree: &DeclTree, id: NodeId, config: &GeneratorConfig) -> Result<String> {
    let mut emitter = Emitter::new(tree, config);
    let text = emitter.emit(id)?;
    if let Some(err) = emitter.into_errors().into_iter().next() {
        return Err(err);
    }
    Ok(text.unwrap_or_default())
}

fn place(items: Vec<String>, placement: Placement) -> String {
    match placement {
        Placement::Chained => items
            .iter()
            .map(|item| format!("\t\t.{item}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Placement::Global => items
            .iter()
            .map(|item| format!("\n\tregistration::{item};\n"))
            .collect(),
    }
}

/// Converter and class registration of `wrapper<name>`.
fn wrapper_registration(name: &str, smart: &SmartPointer) -> String {
    let wrapped = format!("{}<{name}>", smart.wrapper);
    let ctor = |arg: &str| {
        format!("\n\t\t.constructor<{arg}>()\n\t\t(\n\t\t\tpolicy::ctor::as_object\n\t\t)")
    };
    format!(
        "\n\t// register convert() between class {name} and {wrapped}\n\t\
         type::register_wrapper_converter_for_base_classes<{wrapped}>();\n\
         \n\t// register class {wrapped}\n\t\
         registration::class_<{wrapped}>(\"{wrapped}\"){}{};\n",
        ctor(&format!("{}*", smart.base)),
        ctor(&format!("{}&", smart.base)),
    )
}

fn qualify(owner: &str, name: &str) -> String {
    if owner.is_empty() {
        name.to_string()
    } else {
        format!("{owner}::{name}")
    }
}

/// Function type for `select_overload`, e.g. `int(float) const`.
fn signature(overload: &Overload) -> String {
    let constness = if overload.is_const { " const" } else { "" };
    format!("{}({}){constness}", overload.return_type, overload.param_types())
}

fn default_arguments(params: &[Param]) -> Option<String> {
    let defaults: Vec<String> = params
        .iter()
        .filter_map(|p| p.default_value.as_deref())
        .map(|value| {
            if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                format!("std::string({value})")
            } else {
                value.to_string()
            }
        })
        .collect();
    (!defaults.is_empty()).then(|| format!("default_arguments({})", defaults.join(", ")))
}

fn arguments_block(arguments: &[String]) -> String {
    if arguments.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = arguments.iter().map(|a| format!("\t\t\t{a}")).collect();
    format!("\n\t\t(\n{}\n\t\t)", lines.join(",\n"))
}
