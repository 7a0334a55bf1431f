// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory visual tree.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use trickle_core::node::VisualTree;

/// A handle to a node in a [`MemoryTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    tag: String,
    attributes: Vec<String>,
    parent: Option<u32>,
    children: Vec<u32>,
    hidden: bool,
}

/// Arena-backed tree of tagged nodes with attributes and a hidden flag.
///
/// Nodes are never freed; handles stay valid for the life of the tree.
#[derive(Clone, Debug, Default)]
pub struct MemoryTree {
    slots: Vec<Slot>,
    root: Option<NodeId>,
    hidden_writes: u64,
}

impl MemoryTree {
    /// Creates an empty tree with no root container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree whose root container is a fresh `div`.
    #[must_use]
    pub fn with_root() -> (Self, NodeId) {
        let mut tree = Self::new();
        let root = tree.create("div");
        tree.set_root(Some(root));
        (tree, root)
    }

    /// Creates a detached node with the given tag.
    pub fn create(&mut self, tag: &str) -> NodeId {
        let idx = u32::try_from(self.slots.len()).expect("too many nodes");
        self.slots.push(Slot {
            tag: tag.to_ascii_lowercase(),
            ..Slot::default()
        });
        NodeId(idx)
    }

    /// Creates a node with the given tag and appends it to `parent`.
    pub fn element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create(tag);
        self.append(parent, node);
        node
    }

    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.slots[child.0 as usize].parent.take() {
            self.slots[old as usize].children.retain(|&c| c != child.0);
        }
        self.slots[child.0 as usize].parent = Some(parent.0);
        self.slots[parent.0 as usize].children.push(child.0);
    }

    /// Adds an attribute (presence only).
    pub fn set_attribute(&mut self, node: NodeId, name: &str) {
        let attrs = &mut self.slots[node.0 as usize].attributes;
        if !attrs.iter().any(|a| a == name) {
            attrs.push(String::from(name));
        }
    }

    /// Sets or clears the designated root container.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Returns every node that currently carries the hidden marker.
    #[must_use]
    pub fn hidden_nodes(&self) -> Vec<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.hidden)
            .map(|(idx, _)| NodeId(u32::try_from(idx).expect("index fits u32")))
            .collect()
    }

    /// Returns how many times the hidden marker actually changed.
    #[must_use]
    pub fn hidden_writes(&self) -> u64 {
        self.hidden_writes
    }

    /// Returns the number of nodes ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no node was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl VisualTree for MemoryTree {
    type Node = NodeId;

    fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn tag(&self, node: &NodeId) -> Cow<'_, str> {
        Cow::Borrowed(&self.slots[node.0 as usize].tag)
    }

    fn has_attribute(&self, node: &NodeId, name: &str) -> bool {
        self.slots[node.0 as usize]
            .attributes
            .iter()
            .any(|a| a == name)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.slots[node.0 as usize].parent.map(NodeId)
    }

    fn children(&self, node: &NodeId) -> impl Iterator<Item = NodeId> {
        self.slots[node.0 as usize].children.iter().copied().map(NodeId)
    }

    fn set_hidden(&mut self, node: &NodeId, hidden: bool) {
        let slot = &mut self.slots[node.0 as usize];
        if slot.hidden != hidden {
            slot.hidden = hidden;
            self.hidden_writes += 1;
        }
    }

    fn is_hidden(&self, node: &NodeId) -> bool {
        self.slots[node.0 as usize].hidden
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn append_builds_document_order() {
        let (mut tree, root) = MemoryTree::with_root();
        let a = tree.element(root, "DIV");
        let b = tree.element(root, "span");
        let c = tree.element(a, "p");

        assert_eq!(tree.children(&root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.parent(&c), Some(a));
        assert_eq!(tree.tag(&a), "div", "tags are lowercased");
    }

    #[test]
    fn reparenting_detaches_from_old_parent() {
        let (mut tree, root) = MemoryTree::with_root();
        let a = tree.element(root, "div");
        let b = tree.element(root, "div");
        let c = tree.element(a, "span");
        tree.append(b, c);

        assert_eq!(tree.children(&a).count(), 0);
        assert_eq!(tree.children(&b).collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn hidden_writes_count_only_changes() {
        let (mut tree, root) = MemoryTree::with_root();
        let a = tree.element(root, "div");
        tree.set_hidden(&a, false);
        assert_eq!(tree.hidden_writes(), 0, "no-op write is not counted");
        tree.set_hidden(&a, true);
        tree.set_hidden(&a, true);
        assert_eq!(tree.hidden_writes(), 1);
        assert_eq!(tree.hidden_nodes(), vec![a]);
    }
}
