// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM adapter for [`VisualTree`].
//!
//! Elements are wrapped in [`DomNode`]s carrying a numeric identity key. The
//! key lives in a `WeakMap` keyed by the element, so it follows the element
//! for as long as the page keeps it alive and never pins it in memory.

use alloc::borrow::Cow;
use core::cell::Cell;
use core::fmt;
use core::hash::{Hash, Hasher};

use js_sys::{Object, WeakMap};
use wasm_bindgen::JsValue;
use web_sys::Element;

use trickle_core::node::VisualTree;

/// Attribute that marks a node as hidden while it is pending.
///
/// The host page is expected to carry a rule such as
/// `[data-trickle-hidden] { display: none !important; }`.
pub const HIDDEN_MARKER_ATTRIBUTE: &str = "data-trickle-hidden";

/// A DOM element with a stable identity key.
#[derive(Clone)]
pub struct DomNode {
    id: u32,
    element: Element,
}

impl DomNode {
    /// Returns the wrapped element.
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DomNode {}

impl Hash for DomNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomNode({} <{}>)", self.id, self.element.tag_name())
    }
}

/// The live DOM under an optional root container.
pub struct DomTree {
    root: Option<Element>,
    ids: WeakMap,
    next_id: Cell<u32>,
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomTree")
            .field("has_root", &self.root.is_some())
            .field("next_id", &self.next_id.get())
            .finish_non_exhaustive()
    }
}

impl DomTree {
    /// Creates an adapter whose root container is `root`.
    #[must_use]
    pub fn new(root: Option<Element>) -> Self {
        Self {
            root,
            ids: WeakMap::new(),
            next_id: Cell::new(1),
        }
    }

    /// Replaces the root container.
    pub fn set_root(&mut self, root: Option<Element>) {
        self.root = root;
    }

    /// Returns the root container element.
    #[must_use]
    pub fn root_element(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Wraps `element`, assigning it an identity key on first sight.
    pub fn node_for(&self, element: Element) -> DomNode {
        let key: &Object = element.as_ref();
        let id = match self.ids.get(key).as_f64() {
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "keys are u32 values written by this adapter"
            )]
            Some(id) => id as u32,
            None => {
                let id = self.next_id.get();
                self.next_id.set(id.wrapping_add(1));
                self.ids.set(key, &JsValue::from(id));
                id
            }
        };
        DomNode { id, element }
    }
}

impl VisualTree for DomTree {
    type Node = DomNode;

    fn root(&self) -> Option<DomNode> {
        self.root.clone().map(|el| self.node_for(el))
    }

    fn tag(&self, node: &DomNode) -> Cow<'_, str> {
        Cow::Owned(node.element.tag_name().to_ascii_lowercase())
    }

    fn has_attribute(&self, node: &DomNode, name: &str) -> bool {
        node.element.has_attribute(name)
    }

    fn parent(&self, node: &DomNode) -> Option<DomNode> {
        node.element.parent_element().map(|el| self.node_for(el))
    }

    fn children(&self, node: &DomNode) -> impl Iterator<Item = DomNode> {
        let children = node.element.children();
        (0..children.length())
            .filter_map(move |i| children.item(i))
            .map(|el| self.node_for(el))
    }

    fn set_hidden(&mut self, node: &DomNode, hidden: bool) {
        // Only an invalid attribute name can fail, and the marker is valid.
        let result = if hidden {
            node.element.set_attribute(HIDDEN_MARKER_ATTRIBUTE, "")
        } else {
            node.element.remove_attribute(HIDDEN_MARKER_ATTRIBUTE)
        };
        debug_assert!(result.is_ok(), "hidden marker write failed: {result:?}");
    }

    fn is_hidden(&self, node: &DomNode) -> bool {
        node.element.has_attribute(HIDDEN_MARKER_ATTRIBUTE)
    }
}
