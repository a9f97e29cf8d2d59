//! Declaration builder.
//!
//! Walks the declarations of one translation unit with a scope stack and
//! turns every tagged declaration into a node of the shared tree. Each
//! declaration is an isolated unit of work: its failure becomes a diagnostic
//! and the walk moves on to the next sibling.

use std::collections::BTreeMap;
use std::path::Path;

use reflectgen_foundation::{Error, ErrorKind, Result, Severity, Specifier, specifier, strip_quotes};
use reflectgen_model::{
    DeclInfo, EnumInfo, FunctionEntry, NodeData, NodeId, Overload, OverloadKind, Param, Property,
    Record, TemplateInfo, TemplateParam, TemplateParamKind, split_qualified,
};
use reflectgen_source::spelling::{split_template_args, template_uses};
use reflectgen_source::{
    Access, Decl, DeclKind, DeclarationSource, FunctionDecl, FunctionRole, RecordTag,
    TemplateParamDecl,
};
use tracing::{debug, info, trace};

use crate::annotation::{scan_switch, scan_tag};
use crate::config::{
    AS_CONSTRUCTOR, CONSTRUCT_AS_OBJECT, CONSTRUCT_AS_POINTER, FUNC_NAME, FUNC_TYPE,
};
use crate::context::BuildContext;
use crate::tags::{Tag, TagKind};
use crate::template;

/// Outcome of building one translation unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitStatus {
    /// Declarations were walked.
    Built,
    /// The front end reported errors; nothing was walked.
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeState {
    Namespace,
    Reflected(NodeId),
    Untagged,
    Disabled,
    Rejected,
}

#[derive(Clone, Debug)]
struct Scope {
    name: String,
    state: ScopeState,
    rtti_friend: bool,
    is_template: bool,
    is_abstract: bool,
    /// Public methods are reflected without annotations.
    builtin: bool,
}

/// Builds declarations of translation units into a [`BuildContext`].
pub struct Builder<'c> {
    ctx: &'c mut BuildContext,
    scopes: Vec<Scope>,
}

impl<'c> Builder<'c> {
    /// Creates a builder writing into `ctx`.
    pub fn new(ctx: &'c mut BuildContext) -> Self {
        Self {
            ctx,
            scopes: Vec::new(),
        }
    }

    /// Builds one translation unit.
    pub fn build(&mut self, source: &dyn DeclarationSource) -> UnitStatus {
        let unit = source.unit_path();
        let errors_before = self.ctx.diagnostics.error_count();

        if !self.record_frontend_diagnostics(source) {
            info!(unit = %unit.display(), "front end reported errors, unit skipped");
            return UnitStatus::Aborted;
        }
        self.load_tags(source);

        self.scopes.clear();
        let nodes_before = self.ctx.tree.len();
        self.walk(source.declarations(), None);

        info!(
            unit = %unit.display(),
            nodes = self.ctx.tree.len().saturating_sub(nodes_before),
            errors = self.ctx.diagnostics.error_count() - errors_before,
            "built declarations"
        );
        UnitStatus::Built
    }

    fn record_frontend_diagnostics(&mut self, source: &dyn DeclarationSource) -> bool {
        let mut clean = true;
        for diagnostic in source.diagnostics() {
            let kind = if diagnostic.severity >= Severity::Error {
                clean = false;
                ErrorKind::CompileError(diagnostic.message.clone())
            } else {
                ErrorKind::CompileWarning(diagnostic.message.clone())
            };
            self.ctx
                .report(&Error::new(kind).at(&diagnostic.path, diagnostic.line));
        }
        clean
    }

    fn load_tags(&mut self, source: &dyn DeclarationSource) {
        let fresh: Vec<&Path> = {
            let mut paths: Vec<&Path> = source
                .annotations()
                .iter()
                .map(|a| a.path.as_path())
                .filter(|p| !self.ctx.tags.is_loaded(p))
                .collect();
            paths.sort();
            paths.dedup();
            paths
        };

        for invocation in source.annotations() {
            if !fresh.contains(&invocation.path.as_path()) {
                continue;
            }
            let Some(kind) = self.ctx.config.tags.kind_of(&invocation.name) else {
                continue;
            };
            let scanned = if kind == TagKind::Switch {
                scan_switch(&invocation.tokens).map(|bases| Tag::switch(invocation.line, bases))
            } else {
                scan_tag(&invocation.tokens).map(|specs| Tag::new(kind, invocation.line, specs))
            };
            match scanned {
                Ok(tag) => {
                    trace!(
                        path = %invocation.path.display(),
                        line = invocation.line,
                        kind = ?tag.kind,
                        "tag"
                    );
                    self.ctx.tags.insert(&invocation.path, tag);
                }
                Err(err) => self
                    .ctx
                    .report(&err.at(&invocation.path, invocation.line)),
            }
        }

        for path in fresh {
            self.ctx.tags.mark_loaded(path);
        }
    }

    fn walk(&mut self, decls: &[Decl], opening: Option<(&Path, u32)>) {
        let mut previous: Option<&Decl> = None;
        for decl in decls {
            let path = decl.location.path.as_path();
            let floor = match (previous, opening) {
                (Some(prev), _) if prev.location.path == path => prev.location.end_line,
                (_, Some((open_path, line))) if open_path == path => line,
                _ => 0,
            };
            self.visit(decl, floor);
            previous = Some(decl);
        }
    }

    fn visit(&mut self, decl: &Decl, floor: u32) {
        let result = match &decl.kind {
            DeclKind::Namespace => {
                self.visit_namespace(decl);
                Ok(())
            }
            DeclKind::Record {
                tag,
                is_abstract,
                template,
            } => {
                self.visit_record(decl, *tag, *is_abstract, template.as_deref(), floor);
                Ok(())
            }
            DeclKind::Function(function) => self.visit_function(decl, function, floor),
            DeclKind::Variable {
                ty,
                is_member,
                is_static,
            } => self.visit_variable(decl, ty, *is_member, *is_static, floor),
            DeclKind::Enum { is_scoped } => self.visit_enum(decl, *is_scoped, floor),
            DeclKind::ExplicitInstantiation {
                template_name,
                args,
                is_function,
            } => self.visit_instantiation(decl, template_name, args, *is_function),
            DeclKind::BaseSpecifier { .. } | DeclKind::EnumConstant { .. } => Ok(()),
        };
        if let Err(err) = result {
            self.report(err, decl);
        }
    }

    fn report(&mut self, err: Error, decl: &Decl) {
        let located = err
            .context
            .as_ref()
            .is_some_and(|c| c.source.is_some());
        let err = if located {
            err
        } else {
            err.at(&decl.location.path, decl.location.start_line)
        };
        self.ctx.report(&err);
    }

    fn visit_namespace(&mut self, decl: &Decl) {
        let opening = Some((decl.location.path.as_path(), decl.location.start_line));
        if decl.name.is_empty() {
            self.walk(&decl.children, opening);
            return;
        }
        self.scopes.push(Scope {
            name: decl.name.clone(),
            state: ScopeState::Namespace,
            rtti_friend: false,
            is_template: false,
            is_abstract: false,
            builtin: false,
        });
        self.walk(&decl.children, opening);
        self.scopes.pop();
    }

    fn visit_record(
        &mut self,
        decl: &Decl,
        tag: RecordTag,
        is_abstract: bool,
        template: Option<&[TemplateParamDecl]>,
        floor: u32,
    ) {
        let path = decl.location.path.as_path();
        let (start, end) = (decl.location.start_line, decl.location.end_line);
        let kinds: &[TagKind] = match tag {
            RecordTag::Class => &[TagKind::Class],
            RecordTag::Struct => &[TagKind::Struct, TagKind::Class],
        };
        let nested: Vec<(u32, u32)> = decl
            .children
            .iter()
            .filter(|c| c.is_record())
            .map(|c| (c.location.start_line, c.location.end_line))
            .collect();

        let record_tag = self
            .ctx
            .tags
            .find_preceding_any(kinds, path, start, floor)
            .cloned();
        let switch = self
            .ctx
            .tags
            .find_within(TagKind::Switch, path, start, end, &nested)
            .cloned();
        let friend = self
            .ctx
            .tags
            .find_within(TagKind::Friend, path, start, end, &nested)
            .is_some();
        let qualified = self.qualified(&decl.name);
        let builtin = record_tag.is_none() && self.ctx.config.is_builtin(&qualified);

        let mut fresh = false;
        let state = match record_tag {
            None if !builtin => {
                trace!(record = %qualified, "untagged record");
                ScopeState::Untagged
            }
            Some(_)
                if switch.is_none()
                    && !(tag == RecordTag::Struct && self.ctx.config.implicit_struct_rtti) =>
            {
                debug!(record = %qualified, "tagged record without enable switch");
                ScopeState::Disabled
            }
            record_tag => {
                let shape = RecordShape {
                    tag,
                    is_abstract,
                    template,
                    specifiers: record_tag.map(|t| t.specifiers).unwrap_or_default(),
                    switch_bases: switch.map(|s| s.bases),
                    friend,
                    builtin,
                };
                match self.construct_record(decl, shape) {
                    Ok(Some((id, created))) => {
                        fresh = created;
                        ScopeState::Reflected(id)
                    }
                    Ok(None) => ScopeState::Rejected,
                    Err(err) => {
                        self.report(err, decl);
                        ScopeState::Rejected
                    }
                }
            }
        };

        self.scopes.push(Scope {
            name: decl.name.clone(),
            state,
            rtti_friend: friend,
            is_template: template.is_some(),
            is_abstract,
            builtin,
        });
        self.walk(&decl.children, Some((path, start)));
        self.scopes.pop();

        if let (ScopeState::Reflected(id), true) = (state, fresh) {
            if let Err(err) = self.finish_record(decl, id, is_abstract) {
                self.report(err, decl);
            }
        }
    }

    fn construct_record(
        &mut self,
        decl: &Decl,
        shape: RecordShape<'_>,
    ) -> Result<Option<(NodeId, bool)>> {
        let Some(parent) = self.parent_for(&decl.name)? else {
            return Ok(None);
        };
        let path = decl.location.path.as_path();
        let qualified = self.qualified(&decl.name);
        let in_template = self.in_template();

        if let Some(existing) = self.ctx.tree.child(parent, &decl.name) {
            let node = self.ctx.tree.node(existing)?;
            if !node.data.is_record() {
                return Err(Error::name_conflict(format!(
                    "{qualified} is already declared as a {}",
                    node.data.kind_name().to_lowercase()
                )));
            }
            if shape.template.is_none() && !in_template {
                self.ctx.associate(path, existing);
            }
            return Ok(Some((existing, false)));
        }

        let base_classes = self.resolve_bases(
            decl,
            parent,
            &qualified,
            shape.switch_bases.as_deref(),
            shape.builtin,
        )?;

        let mut record = Record::new(DeclInfo::new(shape.specifiers, decl.location.file_info()));
        record.construct_as_pointer = if self.derives_from_pointer_base(&base_classes) {
            true
        } else if shape.builtin {
            false
        } else {
            construct_as_pointer(shape.tag, &record.decl.specifiers)
        };
        record.base_classes = base_classes;
        record.rtti_base_class_names = shape.switch_bases.unwrap_or_default();
        record.rtti_friend = shape.friend;
        record.is_abstract = shape.is_abstract;

        let data = match (shape.template, shape.tag) {
            (Some(params), _) => NodeData::ClassTemplate {
                record,
                template: TemplateInfo {
                    params: params.iter().map(template_param).collect(),
                    ..TemplateInfo::default()
                },
            },
            (None, RecordTag::Class) => NodeData::Class(record),
            (None, RecordTag::Struct) => NodeData::Struct(record),
        };
        let id = self.ctx.tree.insert_child(parent, decl.name.clone(), data)?;

        if shape.template.is_some() {
            self.ctx.templates.register_class(qualified.clone(), id);
        } else if !in_template {
            self.ctx.associate(path, id);
        }
        debug!(record = %qualified, node = %id, "reflected record");
        Ok(Some((id, true)))
    }

    fn resolve_bases(
        &mut self,
        decl: &Decl,
        parent: NodeId,
        qualified: &str,
        listed: Option<&[String]>,
        builtin: bool,
    ) -> Result<BTreeMap<String, NodeId>> {
        let mut bases = BTreeMap::new();
        for base in decl.bases() {
            let written = base.name.as_str();
            let rejected = || Error::base_class_no_rtti(qualified, written);
            let Some(id) = self.resolve_type(parent, written, decl)? else {
                if builtin {
                    trace!(record = qualified, base = written, "unreflected base of builtin");
                    continue;
                }
                return Err(rejected());
            };
            let node = self.ctx.tree.node(id)?;
            let enabled = node.data.record().is_some_and(|r| r.rtti_enabled);
            let base_name = self.ctx.tree.hierarchy_name(id);
            let is_listed = listed.is_none_or(|names| {
                names
                    .iter()
                    .any(|n| same_type(n, written) || same_type(n, &base_name))
            });
            if !enabled || !is_listed {
                if builtin {
                    continue;
                }
                return Err(rejected());
            }
            bases.insert(base_name, id);
        }
        Ok(bases)
    }

    fn derives_from_pointer_base(&self, bases: &BTreeMap<String, NodeId>) -> bool {
        let Some(base) = self.ctx.config.pointer_base.as_deref() else {
            return false;
        };
        let base = base.trim_start_matches("::");
        bases
            .iter()
            .any(|(name, &id)| name == base || self.ctx.tree.derives_from(id, base))
    }

    /// Looks a type up through the scope chain of `from`, then from the root.
    /// Template-ids of registered class templates are instantiated.
    fn resolve_type(&mut self, from: NodeId, written: &str, decl: &Decl) -> Result<Option<NodeId>> {
        if let Some(use_) = split_template_args(written) {
            let scope = self.scope_names();
            if let Some(name) = self.ctx.templates.resolve_class(&use_.name, &scope) {
                return template::instantiate_class(
                    self.ctx,
                    &name,
                    &use_.args,
                    &decl.location.path,
                );
            }
        }
        let segments = split_qualified(written);
        let mut at = Some(from);
        while let Some(scope) = at {
            if let Some(id) = self.ctx.tree.lookup(scope, &segments) {
                return Ok(Some(id));
            }
            at = self.ctx.tree.get(scope).and_then(|n| n.parent);
        }
        Ok(None)
    }

    fn finish_record(&mut self, decl: &Decl, id: NodeId, is_abstract: bool) -> Result<()> {
        let declared: Vec<&FunctionDecl> = decl
            .children
            .iter()
            .filter_map(|c| match &c.kind {
                DeclKind::Function(f) if f.role == FunctionRole::Constructor && !f.is_deleted => {
                    Some(f)
                }
                _ => None,
            })
            .collect();
        let has_default = declared.iter().any(|f| f.is_default_constructor());

        if !is_abstract && !declared.is_empty() && !has_default {
            let qualified = self.ctx.tree.hierarchy_name(id);
            self.ctx.discard(id)?;
            return Err(Error::new(ErrorKind::NoDefaultConstructor(qualified)));
        }

        let synthesize = declared.is_empty() && !is_abstract;
        if synthesize {
            let name = self.ctx.tree.node(id)?.name.clone();
            let mut overload =
                Overload::new(OverloadKind::Constructor { is_normal: true }, name.clone(), "");
            overload.decl.file_info = decl.location.file_info();
            self.add_overload(id, &name, false, None, overload, format!("{name}()"))?;
            trace!(record = %self.ctx.tree.hierarchy_name(id), "synthesized default constructor");
        }

        if let Some(record) = self.ctx.tree.node_mut(id)?.data.record_mut() {
            record.has_constructor = !declared.is_empty() || synthesize;
            record.has_default_constructor = has_default || synthesize;
        }
        Ok(())
    }

    fn visit_function(&mut self, decl: &Decl, function: &FunctionDecl, floor: u32) -> Result<()> {
        if function.is_operator || function.is_deleted {
            return Ok(());
        }
        match function.role {
            FunctionRole::Constructor | FunctionRole::Destructor => {
                self.visit_special_member(decl, function)
            }
            FunctionRole::Free | FunctionRole::Method | FunctionRole::StaticMethod => {
                self.visit_tagged_function(decl, function, floor)
            }
        }
    }

    fn visit_special_member(&mut self, decl: &Decl, function: &FunctionDecl) -> Result<()> {
        let Some(scope) = self.scopes.last() else {
            return Ok(());
        };
        let ScopeState::Reflected(owner) = scope.state else {
            return Ok(());
        };
        let is_constructor = function.role == FunctionRole::Constructor;
        if !self.accessible(decl) || (is_constructor && scope.is_abstract) {
            return Ok(());
        }
        let (kind, entry_name) = if is_constructor {
            (OverloadKind::Constructor { is_normal: true }, scope.name.clone())
        } else {
            (OverloadKind::Destructor, decl.name.clone())
        };
        let overload = to_overload(decl, function, kind, Vec::new());
        self.add_overload(owner, &entry_name, false, None, overload, overload_key(decl, function))?;
        Ok(())
    }

    fn visit_tagged_function(
        &mut self,
        decl: &Decl,
        function: &FunctionDecl,
        floor: u32,
    ) -> Result<()> {
        let path = decl.location.path.as_path();
        let kinds = [TagKind::Function, TagKind::Property];
        let found = self
            .ctx
            .tags
            .find_preceding_any(&kinds, path, decl.location.start_line, floor)
            .cloned();
        let tag = match found {
            Some(tag) => tag,
            None if function.role != FunctionRole::Free && self.in_builtin() => {
                Tag::new(TagKind::Function, decl.location.start_line, Vec::new())
            }
            None => return Ok(()),
        };
        let Some(owner) = self.member_owner()? else {
            return Ok(());
        };
        if !self.accessible(decl) {
            return Ok(());
        }
        let is_property = tag.kind == TagKind::Property;
        let owner_is_record = self.ctx.tree.node(owner)?.data.is_record();

        let kind = match function.role {
            FunctionRole::StaticMethod
                if specifier::find(&tag.specifiers, AS_CONSTRUCTOR).is_some() =>
            {
                OverloadKind::Constructor { is_normal: false }
            }
            FunctionRole::StaticMethod => OverloadKind::Static,
            FunctionRole::Method => OverloadKind::Instance,
            _ => OverloadKind::Free,
        };
        let mut overload = to_overload(decl, function, kind, tag.specifiers.clone());

        let entry_name = if is_property {
            overload.is_getter = accessor_role(&tag.specifiers, function)?;
            property_name(&tag.specifiers).ok_or_else(|| {
                Error::invalid_specifier(format!(
                    "property accessor {} needs {FUNC_NAME}",
                    self.qualified(&decl.name)
                ))
            })?
        } else if matches!(kind, OverloadKind::Constructor { .. }) {
            self.ctx.tree.node(owner)?.name.clone()
        } else {
            decl.name.clone()
        };

        let template = function.template.as_deref().map(|params| TemplateInfo {
            params: params.iter().map(template_param).collect(),
            ..TemplateInfo::default()
        });
        let is_template = template.is_some();
        let key = overload_key(decl, function);
        let entry = self.add_overload(owner, &entry_name, is_property, template, overload, key)?;

        if is_template {
            let qualified = self.ctx.tree.hierarchy_name(entry);
            self.ctx.templates.register_function(qualified, entry);
            return Ok(());
        }
        if !owner_is_record && !self.in_template() {
            self.ctx.associate(path, entry);
        }
        let line = decl.location.start_line;
        self.instantiate_uses(&function.return_type, path, line);
        for param in &function.params {
            self.instantiate_uses(&param.ty, path, line);
        }
        Ok(())
    }

    fn add_overload(
        &mut self,
        owner: NodeId,
        entry_name: &str,
        is_property: bool,
        template: Option<TemplateInfo>,
        overload: Overload,
        key: String,
    ) -> Result<NodeId> {
        let qualified = child_name(&self.ctx.tree.hierarchy_name(owner), entry_name);
        let entry = match self.ctx.tree.child(owner, entry_name) {
            Some(id) => {
                let data = &self.ctx.tree.node(id)?.data;
                match data.entry() {
                    Some(existing) if existing.is_property == is_property => id,
                    Some(_) => {
                        return Err(Error::name_conflict(format!(
                            "{qualified} is used by both a property and a function"
                        )));
                    }
                    None => {
                        return Err(Error::name_conflict(format!(
                            "{qualified} is already declared as a {}",
                            data.kind_name().to_lowercase()
                        )));
                    }
                }
            }
            None => {
                let entry = FunctionEntry {
                    is_property,
                    decl: overload.decl.clone(),
                };
                let data = match template {
                    Some(template) => NodeData::FunctionTemplate { entry, template },
                    None => NodeData::Function(entry),
                };
                let id = self.ctx.tree.insert_child(owner, entry_name, data)?;
                debug!(function = %qualified, property = is_property, "reflected function");
                id
            }
        };

        if self.ctx.tree.child(entry, &key).is_some() {
            return Ok(entry);
        }
        if is_property {
            let roles: Vec<bool> = self
                .ctx
                .tree
                .children(entry)
                .filter_map(|c| match &self.ctx.tree.get(c)?.data {
                    NodeData::Overload(o) => Some(o.is_getter),
                    _ => None,
                })
                .collect();
            if roles.len() >= 2 || roles.contains(&overload.is_getter) {
                return Err(Error::invalid_property_count(qualified, roles.len() + 1));
            }
        }
        self.ctx
            .tree
            .insert_child(entry, key, NodeData::Overload(overload))?;
        Ok(entry)
    }

    fn visit_variable(
        &mut self,
        decl: &Decl,
        ty: &str,
        is_member: bool,
        is_static: bool,
        floor: u32,
    ) -> Result<()> {
        let path = decl.location.path.as_path();
        let Some(tag) = self
            .ctx
            .tags
            .find_preceding(TagKind::Property, path, decl.location.start_line, floor)
            .cloned()
        else {
            return Ok(());
        };
        let Some(owner) = self.member_owner()? else {
            return Ok(());
        };
        if !self.accessible(decl) {
            return Ok(());
        }
        let top_level = !self.ctx.tree.node(owner)?.data.is_record() && !self.in_template();

        if let Some(existing) = self.ctx.tree.child(owner, &decl.name) {
            let data = &self.ctx.tree.node(existing)?.data;
            if !matches!(data, NodeData::Property(_)) {
                return Err(Error::name_conflict(format!(
                    "{} is already declared as a {}",
                    self.qualified(&decl.name),
                    data.kind_name().to_lowercase()
                )));
            }
            if top_level {
                self.ctx.associate(path, existing);
            }
            return Ok(());
        }

        let property = Property {
            data_type: ty.to_string(),
            is_static: is_static || !is_member,
            decl: DeclInfo::new(tag.specifiers, decl.location.file_info()),
        };
        let id = self
            .ctx
            .tree
            .insert_child(owner, decl.name.clone(), NodeData::Property(property))?;
        if top_level {
            self.ctx.associate(path, id);
        }
        debug!(property = %self.ctx.tree.hierarchy_name(id), "reflected property");
        self.instantiate_uses(ty, path, decl.location.start_line);
        Ok(())
    }

    fn visit_enum(&mut self, decl: &Decl, is_scoped: bool, floor: u32) -> Result<()> {
        let path = decl.location.path.as_path();
        let Some(tag) = self
            .ctx
            .tags
            .find_preceding(TagKind::Enum, path, decl.location.start_line, floor)
            .cloned()
        else {
            return Ok(());
        };
        let Some(owner) = self.parent_for(&decl.name)? else {
            return Ok(());
        };
        if !self.accessible(decl) {
            return Ok(());
        }
        let top_level = !self.ctx.tree.node(owner)?.data.is_record() && !self.in_template();

        if let Some(existing) = self.ctx.tree.child(owner, &decl.name) {
            let data = &self.ctx.tree.node(existing)?.data;
            if !matches!(data, NodeData::Enum(_)) {
                return Err(Error::name_conflict(format!(
                    "{} is already declared as a {}",
                    self.qualified(&decl.name),
                    data.kind_name().to_lowercase()
                )));
            }
            if top_level {
                self.ctx.associate(path, existing);
            }
            return Ok(());
        }

        let info = EnumInfo {
            decl: DeclInfo::new(tag.specifiers, decl.location.file_info()),
            is_scoped,
        };
        let id = self
            .ctx
            .tree
            .insert_child(owner, decl.name.clone(), NodeData::Enum(info))?;
        for constant in &decl.children {
            if let DeclKind::EnumConstant { value } = constant.kind {
                self.ctx
                    .tree
                    .insert_child(id, constant.name.clone(), NodeData::EnumConstant { value })?;
            }
        }
        if top_level {
            self.ctx.associate(path, id);
        }
        debug!(enumeration = %self.ctx.tree.hierarchy_name(id), "reflected enum");
        Ok(())
    }

    fn visit_instantiation(
        &mut self,
        decl: &Decl,
        template_name: &str,
        args: &[String],
        is_function: bool,
    ) -> Result<()> {
        let scope = self.scope_names();
        let path = decl.location.path.as_path();
        let resolved = if is_function {
            self.ctx.templates.resolve_function(template_name, &scope)
        } else {
            self.ctx.templates.resolve_class(template_name, &scope)
        };
        let Some(name) = resolved else {
            trace!(template = template_name, "instantiation of an unreflected template");
            return Ok(());
        };
        if is_function {
            template::instantiate_function(self.ctx, &name, args, path)?;
        } else {
            template::instantiate_class(self.ctx, &name, args, path)?;
        }
        Ok(())
    }

    /// Instantiates registered class templates named in a reflected type.
    fn instantiate_uses(&mut self, spelling: &str, path: &Path, line: u32) {
        if self.in_template() {
            return;
        }
        let scope = self.scope_names();
        for use_ in template_uses(spelling) {
            let Some(name) = self.ctx.templates.resolve_class(&use_.name, &scope) else {
                continue;
            };
            if let Err(err) = template::instantiate_class(self.ctx, &name, &use_.args, path) {
                self.ctx.report(&err.at(path, line));
            }
        }
    }

    /// Parent node for a nested declaration, creating namespaces on demand.
    ///
    /// `Ok(None)` means an enclosing record was rejected and its error is
    /// already recorded.
    fn parent_for(&mut self, name: &str) -> Result<Option<NodeId>> {
        let mut at = self.ctx.tree.root();
        for (depth, scope) in self.scopes.iter().enumerate() {
            at = match scope.state {
                ScopeState::Namespace => match self.ctx.tree.child(at, &scope.name) {
                    Some(id) => id,
                    None => {
                        let id = self
                            .ctx
                            .tree
                            .insert_child(at, scope.name.clone(), NodeData::Namespace)?;
                        trace!(namespace = %self.ctx.tree.hierarchy_name(id), "created namespace");
                        id
                    }
                },
                ScopeState::Reflected(id) => id,
                ScopeState::Disabled => {
                    return Err(Error::rtti_disabled(join_scope(&self.scopes[..=depth], None)));
                }
                ScopeState::Untagged => {
                    return Err(Error::no_parent(join_scope(&self.scopes, Some(name))));
                }
                ScopeState::Rejected => return Ok(None),
            };
        }
        Ok(Some(at))
    }

    /// Owner of a function or variable. Members of untagged records are inert.
    fn member_owner(&mut self) -> Result<Option<NodeId>> {
        match self.scopes.last().map(|s| s.state) {
            None | Some(ScopeState::Namespace) => self.parent_for(""),
            Some(ScopeState::Reflected(id)) => Ok(Some(id)),
            Some(ScopeState::Disabled) => Err(Error::rtti_disabled(join_scope(&self.scopes, None))),
            Some(ScopeState::Untagged | ScopeState::Rejected) => Ok(None),
        }
    }

    fn accessible(&self, decl: &Decl) -> bool {
        decl.access == Access::Public || self.scopes.last().is_some_and(|s| s.rtti_friend)
    }

    fn in_builtin(&self) -> bool {
        self.scopes.last().is_some_and(|s| s.builtin)
    }

    fn in_template(&self) -> bool {
        self.scopes.iter().any(|s| s.is_template)
    }

    fn scope_names(&self) -> Vec<String> {
        self.scopes.iter().map(|s| s.name.clone()).collect()
    }

    fn qualified(&self, name: &str) -> String {
        join_scope(&self.scopes, Some(name))
    }
}

struct RecordShape<'d> {
    tag: RecordTag,
    is_abstract: bool,
    template: Option<&'d [TemplateParamDecl]>,
    specifiers: Vec<Specifier>,
    switch_bases: Option<Vec<String>>,
    friend: bool,
    builtin: bool,
}

fn join_scope(scopes: &[Scope], name: Option<&str>) -> String {
    scopes
        .iter()
        .map(|s| s.name.as_str())
        .chain(name)
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join("::")
}

fn child_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}::{name}")
    }
}

fn same_type(a: &str, b: &str) -> bool {
    let a = a.trim().trim_start_matches("::");
    let b = b.trim().trim_start_matches("::");
    a == b || a.ends_with(&format!("::{b}")) || b.ends_with(&format!("::{a}"))
}

fn construct_as_pointer(tag: RecordTag, specifiers: &[Specifier]) -> bool {
    if specifier::find(specifiers, CONSTRUCT_AS_POINTER).is_some() {
        true
    } else if specifier::find(specifiers, CONSTRUCT_AS_OBJECT).is_some() {
        false
    } else {
        tag == RecordTag::Class
    }
}

fn property_name(specifiers: &[Specifier]) -> Option<String> {
    specifier::find(specifiers, FUNC_NAME)
        .map(|s| strip_quotes(&s.value).to_string())
        .filter(|name| !name.is_empty())
}

fn accessor_role(specifiers: &[Specifier], function: &FunctionDecl) -> Result<bool> {
    match specifier::find(specifiers, FUNC_TYPE).map(Specifier::unquoted_value) {
        None => Ok(function.is_const),
        Some("getter") => Ok(true),
        Some("setter") => Ok(false),
        Some(other) => Err(Error::invalid_specifier(format!(
            "{FUNC_TYPE} must be \"getter\" or \"setter\", found `{other}`"
        ))),
    }
}

fn to_overload(
    decl: &Decl,
    function: &FunctionDecl,
    kind: OverloadKind,
    specifiers: Vec<Specifier>,
) -> Overload {
    Overload {
        kind,
        source_name: decl.name.clone(),
        is_const: function.is_const,
        is_getter: false,
        return_type: function.return_type.clone(),
        params: function
            .params
            .iter()
            .map(|p| Param {
                ty: p.ty.clone(),
                name: p.name.clone(),
                default_value: p.default_value.clone(),
            })
            .collect(),
        decl: DeclInfo::new(specifiers, decl.location.file_info()),
    }
}

fn overload_key(decl: &Decl, function: &FunctionDecl) -> String {
    if function.usr.is_empty() {
        function.signature(&decl.name)
    } else {
        function.usr.clone()
    }
}

fn template_param(param: &TemplateParamDecl) -> TemplateParam {
    TemplateParam {
        name: param.name.clone(),
        type_spelling: param.type_spelling.clone(),
        kind: match param.kind {
            reflectgen_source::TemplateParamKind::Type => TemplateParamKind::Type,
            reflectgen_source::TemplateParamKind::NonType => TemplateParamKind::NonType,
            reflectgen_source::TemplateParamKind::TemplateTemplate => {
                TemplateParamKind::TemplateTemplate
            }
        },
        default: param.default.clone(),
    }
}
