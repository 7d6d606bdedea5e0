//! Ordered key/value tree emitted as the build description.
//!
//! Nodes live in an arena owned by [`Registry`] and are addressed by
//! [`NodeId`] handles, which stay valid for the lifetime of the registry no
//! matter how many nodes are added later. Every node keeps its children in
//! insertion order (serialisation order) plus two lookup indices: one by key
//! (last write wins) backing [`Registry::set_child`], and one by `(key,
//! value)` backing [`Registry::add_unique_child`].
//!
//! # Examples
//!
//! ```
//! use mheader::registry::Registry;
//!
//! let mut registry = Registry::new();
//! let root = registry.root();
//! let target = registry.add_child(root, "%Target", "Exe_app");
//! registry.add_child(target, "Target.Type", "ConsoleExecutable");
//! assert_eq!(
//!     registry.to_string(),
//!     "%Target \"Exe_app\"\n{\n\tTarget.Type \"ConsoleExecutable\"\n}\n"
//! );
//! ```

mod write;

use crate::outputs::PathValue;
use std::collections::{HashMap, VecDeque};

/// Keys that denote structural node kinds.
pub mod kind {
    /// A buildable unit.
    pub const TARGET: &str = "%Target";
    /// One directory segment of the source hierarchy.
    pub const GROUP: &str = "%Group";
    /// A source or generated file.
    pub const FILE: &str = "%File";
    /// An edge to another target.
    pub const DEPENDENCY: &str = "%Dependency";
}

/// Stable handle to a node of a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A single entry of the description.
#[derive(Debug, Default, Clone)]
pub struct Node {
    key: String,
    value: String,
    children: VecDeque<NodeId>,
    by_key: HashMap<String, NodeId>,
    by_entry: HashMap<(String, String), NodeId>,
    /// Forbids collapsing this node while pruning lone groups.
    pub protected: bool,
    /// Emit the key verbatim instead of escaping it.
    pub raw_key: bool,
    /// Emit the value verbatim instead of escaping it.
    pub raw_value: bool,
}

impl Node {
    /// The node's key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The node's value, possibly empty.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` when the node's key is `kind`.
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.key == kind
    }

    /// Children in serialisation order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.children.iter().copied()
    }

    /// The child most recently added under `key`.
    #[must_use]
    pub fn child_by_key(&self, key: &str) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    /// The child most recently added with exactly `key` and `value`.
    #[must_use]
    pub fn child_by_entry(&self, key: &str, value: &str) -> Option<NodeId> {
        self.by_entry
            .get(&(key.to_owned(), value.to_owned()))
            .copied()
    }
}

/// Arena-backed description tree with an implicit, unserialised root.
#[derive(Debug, Clone)]
pub struct Registry {
    nodes: Vec<Node>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Handle of the root node. Only its children are serialised.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow the node behind `id`.
    #[must_use]
    #[expect(
        clippy::indexing_slicing,
        reason = "node ids are only minted by this arena and nodes are never removed"
    )]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Mutably borrow the node behind `id` to adjust its flags.
    #[must_use]
    #[expect(
        clippy::indexing_slicing,
        reason = "node ids are only minted by this arena and nodes are never removed"
    )]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn insert(&mut self, parent: NodeId, key: String, value: String, front: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            key: key.clone(),
            value: value.clone(),
            ..Node::default()
        });
        let parent_node = self.node_mut(parent);
        if front {
            parent_node.children.push_front(id);
        } else {
            parent_node.children.push_back(id);
        }
        parent_node.by_key.insert(key.clone(), id);
        parent_node.by_entry.insert((key, value), id);
        id
    }

    /// Append a new child to `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        self.insert(parent, key.into(), value.into(), false)
    }

    /// Prepend a new child to `parent`.
    pub fn push_front_child(
        &mut self,
        parent: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        self.insert(parent, key.into(), value.into(), true)
    }

    /// Append a child whose value is a path, emitting dynamic paths verbatim.
    pub fn add_path_child(
        &mut self,
        parent: NodeId,
        key: impl Into<String>,
        value: &PathValue,
    ) -> NodeId {
        let id = self.add_child(parent, key, value.render());
        self.node_mut(id).raw_value = value.is_dynamic();
        id
    }

    /// Overwrite the value of the child stored under `key`, or append a new
    /// child when none exists.
    pub fn set_child(
        &mut self,
        parent: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let key = key.into();
        let value = value.into();
        let Some(id) = self.node(parent).child_by_key(&key) else {
            return self.insert(parent, key, value, false);
        };
        let previous = std::mem::replace(&mut self.node_mut(id).value, value.clone());
        let parent_node = self.node_mut(parent);
        let stale = (key, previous);
        if parent_node.by_entry.get(&stale) == Some(&id) {
            parent_node.by_entry.remove(&stale);
        }
        parent_node.by_entry.insert((stale.0, value), id);
        id
    }

    /// Return the child with exactly `key` and `value`, appending it first if
    /// it does not exist yet.
    pub fn add_unique_child(
        &mut self,
        parent: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let key = key.into();
        let value = value.into();
        match self.node(parent).child_by_entry(&key, &value) {
            Some(id) => id,
            None => self.insert(parent, key, value, false),
        }
    }

    /// Follow a chain of lone, unprotected groups from `id` down to the
    /// deepest group of the chain.
    #[must_use]
    pub fn collapse_group_chain(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            let node = self.node(current);
            if !node.is(kind::GROUP) || node.protected || node.children.len() != 1 {
                return current;
            }
            match node.children.front() {
                Some(&only) if self.node(only).is(kind::GROUP) => current = only,
                _ => return current,
            }
        }
    }

    /// Collapse every chain of single-child groups directly under `parent`
    /// into its deepest group.
    pub fn prune_lone_children(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.node(parent).children().collect();
        for (position, child) in children.into_iter().enumerate() {
            if !self.node(child).is(kind::GROUP) {
                continue;
            }
            let survivor = self.collapse_group_chain(child);
            if survivor != child {
                self.replace_child(parent, position, child, survivor);
            }
        }
    }

    fn replace_child(&mut self, parent: NodeId, position: usize, old: NodeId, new: NodeId) {
        let old_entry = {
            let node = self.node(old);
            (node.key.clone(), node.value.clone())
        };
        let new_entry = {
            let node = self.node(new);
            (node.key.clone(), node.value.clone())
        };
        let parent_node = self.node_mut(parent);
        if let Some(slot) = parent_node.children.get_mut(position) {
            *slot = new;
        }
        if parent_node.by_key.get(&old_entry.0) == Some(&old) {
            parent_node.by_key.remove(&old_entry.0);
            parent_node.by_key.insert(new_entry.0.clone(), new);
        }
        if parent_node.by_entry.get(&old_entry) == Some(&old) {
            parent_node.by_entry.remove(&old_entry);
        }
        parent_node.by_entry.insert(new_entry, new);
    }
}
