//! Template registry and instantiation.
//!
//! An instance is a deep copy of the template subtree, renamed to its
//! template-id (`Vec<float>`) and with every formal parameter replaced by its
//! actual argument. Instances are cached by `(template, arguments)`, so asking
//! twice yields the same node.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use reflectgen_foundation::{Error, Result};
use reflectgen_model::{DeclTree, NodeData, NodeId, TemplateParam};
use reflectgen_source::spelling::replace_identifiers;
use tracing::debug;

use crate::context::BuildContext;

/// Class and function templates known to the run.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    classes: BTreeMap<String, NodeId>,
    functions: BTreeMap<String, NodeId>,
    instances: HashMap<(String, Vec<String>), NodeId>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class template under its qualified name.
    pub fn register_class(&mut self, qualified: impl Into<String>, id: NodeId) {
        self.classes.insert(qualified.into(), id);
    }

    /// Registers a function template under its qualified name.
    pub fn register_function(&mut self, qualified: impl Into<String>, id: NodeId) {
        self.functions.insert(qualified.into(), id);
    }

    /// Class template by qualified name.
    #[must_use]
    pub fn class(&self, qualified: &str) -> Option<NodeId> {
        self.classes.get(qualified).copied()
    }

    /// Function template by qualified name.
    #[must_use]
    pub fn function(&self, qualified: &str) -> Option<NodeId> {
        self.functions.get(qualified).copied()
    }

    /// Resolves a class template name as written inside `scope`.
    #[must_use]
    pub fn resolve_class(&self, name: &str, scope: &[String]) -> Option<String> {
        resolve(&self.classes, name, scope)
    }

    /// Resolves a function template name as written inside `scope`.
    #[must_use]
    pub fn resolve_function(&self, name: &str, scope: &[String]) -> Option<String> {
        resolve(&self.functions, name, scope)
    }

    /// Cached instance of `qualified` with `args`.
    #[must_use]
    pub fn instance(&self, qualified: &str, args: &[String]) -> Option<NodeId> {
        self.instances
            .get(&(qualified.to_string(), args.to_vec()))
            .copied()
    }

    /// Number of cached instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub(crate) fn forget(&mut self, dead: &BTreeSet<NodeId>) {
        self.classes.retain(|_, id| !dead.contains(id));
        self.functions.retain(|_, id| !dead.contains(id));
        self.instances.retain(|_, id| !dead.contains(id));
    }
}

fn resolve(map: &BTreeMap<String, NodeId>, name: &str, scope: &[String]) -> Option<String> {
    let name = name.trim().trim_start_matches("::");
    for depth in (0..=scope.len()).rev() {
        let candidate = if depth == 0 {
            name.to_string()
        } else {
            format!("{}::{name}", scope[..depth].join("::"))
        };
        if map.contains_key(&candidate) {
            return Some(candidate);
        }
    }
    let suffix = format!("::{name}");
    let mut matches = map.keys().filter(|key| key.ends_with(&suffix));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only.clone()),
        _ => None,
    }
}

/// Replaces each whole-identifier occurrence of `formals[i]` with `actuals[i]`.
#[must_use]
pub fn substitute(spelling: &str, formals: &[String], actuals: &[String]) -> String {
    replace_identifiers(spelling, |word| {
        formals
            .iter()
            .position(|formal| formal == word)
            .and_then(|i| actuals.get(i))
            .map(String::as_str)
    })
}

/// Instantiates the class template registered as `qualified`.
///
/// Returns `Ok(None)` when no such template is registered.
///
/// # Errors
///
/// Fails on an argument count mismatch or when the copy cannot be made.
pub fn instantiate_class(
    ctx: &mut BuildContext,
    qualified: &str,
    actuals: &[String],
    use_site: &Path,
) -> Result<Option<NodeId>> {
    match ctx.templates.class(qualified) {
        Some(template) => instantiate(ctx, qualified, template, actuals, use_site).map(Some),
        None => Ok(None),
    }
}

/// Instantiates the function template registered as `qualified`.
///
/// Returns `Ok(None)` when no such template is registered.
///
/// # Errors
///
/// Fails on an argument count mismatch or when the copy cannot be made.
pub fn instantiate_function(
    ctx: &mut BuildContext,
    qualified: &str,
    actuals: &[String],
    use_site: &Path,
) -> Result<Option<NodeId>> {
    match ctx.templates.function(qualified) {
        Some(template) => instantiate(ctx, qualified, template, actuals, use_site).map(Some),
        None => Ok(None),
    }
}

fn instantiate(
    ctx: &mut BuildContext,
    qualified: &str,
    template: NodeId,
    actuals: &[String],
    use_site: &Path,
) -> Result<NodeId> {
    let node = ctx.tree.node(template)?;
    let params = node
        .data
        .template()
        .map(|t| t.params.clone())
        .ok_or_else(|| Error::internal(format!("{qualified} is not a template")))?;
    let parent = node
        .parent
        .ok_or_else(|| Error::internal("template without a parent"))?;
    let base_name = node.name.clone();

    let formals: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
    let actuals = complete_arguments(qualified, &params, &formals, actuals)?;
    let key = (qualified.to_string(), actuals.clone());
    if let Some(&cached) = ctx.templates.instances.get(&key) {
        if ctx.tree.get(cached).is_some() {
            return Ok(cached);
        }
    }

    let instance_name = format!("{base_name}<{}>", actuals.join(", "));
    if let Some(existing) = ctx.tree.child(parent, &instance_name) {
        ctx.templates.instances.insert(key, existing);
        return Ok(existing);
    }

    let instance = ctx.tree.clone_subtree(template, parent, instance_name)?;
    if let Err(err) = substitute_subtree(&mut ctx.tree, instance, &formals, &actuals) {
        ctx.discard(instance)?;
        return Err(err);
    }
    if let Some(info) = ctx.tree.node_mut(instance)?.data.template_mut() {
        info.is_specialization = true;
        info.actual_args.clone_from(&actuals);
    }

    let parent_is_namespace = matches!(ctx.tree.node(parent)?.data, NodeData::Namespace);
    for id in ctx.tree.walk(instance) {
        let is_record = ctx.tree.node(id)?.data.is_record();
        if is_record || (id == instance && parent_is_namespace) {
            ctx.associate(use_site, id);
        }
    }
    ctx.templates.instances.insert(key, instance);
    debug!(
        template = qualified,
        instance = %ctx.tree.hierarchy_name(instance),
        "instantiated template"
    );
    Ok(instance)
}

fn complete_arguments(
    qualified: &str,
    params: &[TemplateParam],
    formals: &[String],
    actuals: &[String],
) -> Result<Vec<String>> {
    let mut completed: Vec<String> = actuals.iter().map(|a| a.trim().to_string()).collect();
    if completed.len() > params.len() {
        return Err(arity_error(qualified, params.len(), completed.len()));
    }
    for param in &params[completed.len()..] {
        let Some(default) = &param.default else {
            return Err(arity_error(qualified, params.len(), actuals.len()));
        };
        let filled = substitute(default, &formals[..completed.len()], &completed);
        completed.push(filled);
    }
    Ok(completed)
}

fn arity_error(qualified: &str, expected: usize, found: usize) -> Error {
    Error::invalid_specifier(format!(
        "{qualified} takes {expected} template arguments, {found} given"
    ))
}

fn substitute_subtree(
    tree: &mut DeclTree,
    instance: NodeId,
    formals: &[String],
    actuals: &[String],
) -> Result<()> {
    let sub = |s: &str| substitute(s, formals, actuals);
    for id in tree.walk(instance) {
        if id != instance {
            let name = tree.node(id)?.name.clone();
            let renamed = sub(&name);
            if renamed != name {
                tree.rename(id, renamed.clone()).map_err(|_| {
                    Error::name_conflict(format!(
                        "{renamed} collides with another member of {}",
                        tree.hierarchy_name(instance)
                    ))
                })?;
            }
        }

        let data = &mut tree.node_mut(id)?.data;
        if let Some(decl) = data.decl_mut() {
            for specifier in &mut decl.specifiers {
                specifier.value = sub(&specifier.value);
            }
        }
        if let Some(template) = data.template_mut() {
            for param in &mut template.params {
                param.type_spelling = sub(&param.type_spelling);
            }
        }
        match &mut *data {
            NodeData::Overload(overload) => {
                overload.return_type = sub(&overload.return_type);
                for param in &mut overload.params {
                    param.ty = sub(&param.ty);
                    if let Some(default) = &mut param.default_value {
                        *default = sub(default);
                    }
                }
            }
            NodeData::Property(property) => property.data_type = sub(&property.data_type),
            _ => {}
        }
        if let Some(record) = data.record_mut() {
            record.base_classes = std::mem::take(&mut record.base_classes)
                .into_iter()
                .map(|(name, base)| (sub(&name), base))
                .collect();
            for name in &mut record.rtti_base_class_names {
                *name = sub(name);
            }
        }
    }
    Ok(())
}
