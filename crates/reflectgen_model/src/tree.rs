//! Arena-backed declaration tree.
//!
//! Children are owned through their parent's name map; the parent link is a
//! plain handle. Removed slots go on a free list and are reused.

use std::collections::{BTreeMap, HashSet};

use reflectgen_foundation::{Error, Result};

use crate::node::{Node, NodeData, NodeId};

/// The declaration tree of one generation run.
#[derive(Clone, Debug)]
pub struct DeclTree {
    slots: Vec<Option<Node>>,
    free_list: Vec<u32>,
    live_count: usize,
}

impl Default for DeclTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclTree {
    /// Creates a tree holding only the unnamed root namespace.
    #[must_use]
    pub fn new() -> Self {
        let root = Node {
            name: String::new(),
            parent: None,
            children: BTreeMap::new(),
            data: NodeData::Namespace,
        };
        Self {
            slots: vec![Some(root)],
            free_list: Vec::new(),
            live_count: 1,
        }
    }

    /// The root namespace.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if only the root exists.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live_count <= 1
    }

    /// Returns the node, if live.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns the node mutably, if live.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Returns the node or an internal error for a dangling handle.
    ///
    /// # Errors
    ///
    /// Fails if `id` does not refer to a live node.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| Error::internal(format!("dangling node handle {id}")))
    }

    /// Mutable variant of [`Self::node`].
    ///
    /// # Errors
    ///
    /// Fails if `id` does not refer to a live node.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id)
            .ok_or_else(|| Error::internal(format!("dangling node handle {id}")))
    }

    /// Adds a child named `name` under `parent`.
    ///
    /// # Errors
    ///
    /// Fails if the parent is dangling or already has a child of that name.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        data: NodeData,
    ) -> Result<NodeId> {
        let name = name.into();
        if self.node(parent)?.children.contains_key(&name) {
            return Err(Error::internal(format!(
                "{} already has a child named {name}",
                self.describe(parent)
            )));
        }
        let node = Node {
            name: name.clone(),
            parent: Some(parent),
            children: BTreeMap::new(),
            data,
        };
        let id = if let Some(index) = self.free_list.pop() {
            self.slots[index as usize] = Some(node);
            NodeId(index)
        } else {
            let index = u32::try_from(self.slots.len())
                .map_err(|_| Error::internal("declaration tree is full"))?;
            self.slots.push(Some(node));
            NodeId(index)
        };
        self.live_count += 1;
        self.node_mut(parent)?.children.insert(name, id);
        Ok(id)
    }

    /// Direct child of `parent` named `name`.
    #[must_use]
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)?.children.get(name).copied()
    }

    /// Children of `id` in name order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(|node| node.children.values().copied())
    }

    /// Follows `segments` downward from `from`.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, from: NodeId, segments: &[S]) -> Option<NodeId> {
        segments
            .iter()
            .try_fold(from, |at, segment| self.child(at, segment.as_ref()))
    }

    /// Looks up a `::`-qualified name from the root.
    #[must_use]
    pub fn lookup_qualified(&self, name: &str) -> Option<NodeId> {
        self.lookup(self.root(), &split_qualified(name))
    }

    /// Parent chain of `id`, nearest first, ending at the root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut at = self.get(id).and_then(|n| n.parent);
        while let Some(parent) = at {
            chain.push(parent);
            at = self.get(parent).and_then(|n| n.parent);
        }
        chain
    }

    /// `::`-joined names from below the root down to `id`.
    #[must_use]
    pub fn hierarchy_name(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .chain(std::iter::once(id))
            .filter(|&n| n != self.root())
            .filter_map(|n| self.get(n).map(|node| node.name.as_str()))
            .collect();
        names.retain(|n| !n.is_empty());
        names.join("::")
    }

    /// Nodes of the subtree at `id` in pre-order.
    #[must_use]
    pub fn walk(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(at) = stack.pop() {
            let Some(node) = self.get(at) else {
                continue;
            };
            order.push(at);
            stack.extend(node.children.values().rev().copied());
        }
        order
    }

    /// Detaches and frees the subtree at `id`.
    ///
    /// # Errors
    ///
    /// Fails for the root or a dangling handle.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        let Some(parent) = node.parent else {
            return Err(Error::internal("cannot remove the root namespace"));
        };
        let name = node.name.clone();
        self.node_mut(parent)?.children.remove(&name);
        for dead in self.walk(id) {
            self.slots[dead.index()] = None;
            self.free_list.push(dead.0);
            self.live_count -= 1;
        }
        Ok(())
    }

    /// Deep-copies the subtree at `source` under `parent` as `name`.
    ///
    /// Non-owning references such as base classes keep pointing at the
    /// original targets.
    ///
    /// # Errors
    ///
    /// Fails on dangling handles, a name clash under `parent`, or when
    /// `parent` lies inside the copied subtree.
    pub fn clone_subtree(
        &mut self,
        source: NodeId,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId> {
        if parent == source || self.ancestors(parent).contains(&source) {
            return Err(Error::internal(format!(
                "cannot copy {} into itself",
                self.describe(source)
            )));
        }
        self.clone_into(source, parent, name.into())
    }

    fn clone_into(&mut self, source: NodeId, parent: NodeId, name: String) -> Result<NodeId> {
        let node = self.node(source)?;
        let data = node.data.clone();
        let children: Vec<(String, NodeId)> = node
            .children
            .iter()
            .map(|(n, &c)| (n.clone(), c))
            .collect();
        let copy = self.insert_child(parent, name, data)?;
        for (child_name, child) in children {
            self.clone_into(child, copy, child_name)?;
        }
        Ok(copy)
    }

    /// Renames `id`, keeping its parent's map consistent.
    ///
    /// # Errors
    ///
    /// Fails for the root, a dangling handle, or a sibling name clash.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let node = self.node(id)?;
        let Some(parent) = node.parent else {
            return Err(Error::internal("cannot rename the root namespace"));
        };
        if node.name == name {
            return Ok(());
        }
        let old = node.name.clone();
        let siblings = &mut self.node_mut(parent)?.children;
        if siblings.contains_key(&name) {
            return Err(Error::internal(format!("sibling named {name} already exists")));
        }
        siblings.remove(&old);
        siblings.insert(name.clone(), id);
        self.node_mut(id)?.name = name;
        Ok(())
    }

    /// Whether the record at `id` derives, directly or through its bases,
    /// from the record whose hierarchy name is `base`.
    #[must_use]
    pub fn derives_from(&self, id: NodeId, base: &str) -> bool {
        let base = base.trim_start_matches("::");
        let mut pending = vec![id];
        let mut seen = HashSet::new();
        while let Some(at) = pending.pop() {
            if !seen.insert(at) {
                continue;
            }
            let Some(record) = self.get(at).and_then(|n| n.data.record()) else {
                continue;
            };
            for (name, &parent) in &record.base_classes {
                if name == base {
                    return true;
                }
                pending.push(parent);
            }
        }
        false
    }

    /// Kind and qualified name, for messages.
    #[must_use]
    pub fn describe(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(node) if id == self.root() => node.data.kind_name().to_lowercase() + " (global)",
            Some(node) => format!(
                "{} {}",
                node.data.kind_name().to_lowercase(),
                self.hierarchy_name(id)
            ),
            None => format!("dangling node {id}"),
        }
    }
}

/// Splits `a::b<c::d>::e` into `["a", "b<c::d>", "e"]`.
///
/// A leading `::` is ignored.
#[must_use]
pub fn split_qualified(name: &str) -> Vec<&str> {
    let name = name.trim().trim_start_matches("::");
    let bytes = name.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' => depth += 1,
            b'>' | b')' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                parts.push(name[start..i].trim());
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    if start < name.len() {
        parts.push(name[start..].trim());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DeclInfo, Record};

    fn class() -> NodeData {
        NodeData::Class(Record::new(DeclInfo::default()))
    }

    fn sample() -> (DeclTree, NodeId, NodeId) {
        let mut tree = DeclTree::new();
        let ns = tree
            .insert_child(tree.root(), "game", NodeData::Namespace)
            .unwrap();
        let actor = tree.insert_child(ns, "Actor", class()).unwrap();
        tree.insert_child(actor, "health", NodeData::EnumConstant { value: 1 })
            .unwrap();
        (tree, ns, actor)
    }

    #[test]
    fn insert_and_lookup() {
        let (tree, ns, actor) = sample();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.child(ns, "Actor"), Some(actor));
        assert_eq!(tree.lookup_qualified("game::Actor"), Some(actor));
        assert_eq!(tree.lookup_qualified("::game::Actor"), Some(actor));
        assert_eq!(tree.lookup(ns, &["Actor", "health"]), tree.walk(actor).get(1).copied());
        assert_eq!(tree.hierarchy_name(actor), "game::Actor");
        assert_eq!(tree.ancestors(actor), vec![ns, tree.root()]);
    }

    #[test]
    fn duplicate_child_is_rejected() {
        let (mut tree, ns, _) = sample();
        assert!(tree.insert_child(ns, "Actor", class()).is_err());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn children_iterate_in_name_order() {
        let mut tree = DeclTree::new();
        let root = tree.root();
        for name in ["zeta", "alpha", "mid"] {
            tree.insert_child(root, name, NodeData::Namespace).unwrap();
        }
        let names: Vec<_> = tree
            .children(root)
            .map(|c| tree.get(c).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn remove_frees_and_reuses_slots() {
        let (mut tree, ns, actor) = sample();
        tree.remove_subtree(actor).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.get(actor).is_none());
        assert!(tree.child(ns, "Actor").is_none());
        let again = tree.insert_child(ns, "Other", class()).unwrap();
        assert!(again.index() < 4);
        assert!(tree.remove_subtree(tree.root()).is_err());
    }

    #[test]
    fn clone_subtree_is_deep() {
        let (mut tree, ns, actor) = sample();
        let copy = tree.clone_subtree(actor, ns, "Actor2").unwrap();
        assert_eq!(tree.len(), 6);
        assert_ne!(tree.child(copy, "health"), tree.child(actor, "health"));
        assert!(tree.clone_subtree(ns, actor, "Loop").is_err());
    }

    #[test]
    fn rename_updates_parent_map() {
        let (mut tree, ns, actor) = sample();
        tree.rename(actor, "Pawn").unwrap();
        assert_eq!(tree.child(ns, "Pawn"), Some(actor));
        assert!(tree.child(ns, "Actor").is_none());
        assert_eq!(tree.hierarchy_name(actor), "game::Pawn");
    }

    #[test]
    fn derivation_follows_base_chains() {
        let (mut tree, ns, actor) = sample();
        let object = tree.insert_child(tree.root(), "Object", class()).unwrap();
        if let Some(record) = tree.node_mut(actor).unwrap().data.record_mut() {
            record.base_classes.insert("Object".into(), object);
        }
        let mut pawn = Record::new(DeclInfo::default());
        pawn.base_classes.insert("game::Actor".into(), actor);
        let pawn = tree.insert_child(ns, "Pawn", NodeData::Class(pawn)).unwrap();

        assert!(tree.derives_from(pawn, "game::Actor"));
        assert!(tree.derives_from(pawn, "::Object"));
        assert!(tree.derives_from(actor, "Object"));
        assert!(!tree.derives_from(object, "Object"));
        assert!(!tree.derives_from(pawn, "Actor"));
        assert!(!tree.derives_from(ns, "Object"));
    }

    #[test]
    fn walk_is_preorder() {
        let (tree, ns, actor) = sample();
        let order = tree.walk(tree.root());
        assert_eq!(&order[..3], &[tree.root(), ns, actor]);
    }

    #[test]
    fn split_respects_template_arguments() {
        assert_eq!(split_qualified("a::Vec<b::C, 2>::d"), vec!["a", "Vec<b::C, 2>", "d"]);
        assert_eq!(split_qualified("::x"), vec!["x"]);
        assert!(split_qualified("").is_empty());
    }
}
