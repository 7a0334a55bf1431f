// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node capability surface.
//!
//! The scheduler never binds to a concrete platform tree. Everything it needs
//! from the host's visual tree is expressed by [`VisualTree`]: identity of
//! node handles, a tag name, attribute presence, upward and downward
//! traversal, and the hidden-marker toggle.
//!
//! The scheduler holds node handles only while a node is pending and uses
//! them for identity comparison and capability queries. Whether a handle
//! keeps its node alive is up to the backend; a handle to a host object
//! (such as a DOM element) does so until the node is drained.

use alloc::borrow::Cow;
use core::fmt::Debug;
use core::hash::Hash;

/// The host visual tree as seen by a [`Session`](crate::session::Session).
///
/// Implemented by `DomTree` in the web backend and by `MemoryTree` in the
/// harness.
pub trait VisualTree {
    /// A handle to one node, held only while the node is pending.
    ///
    /// Equality and hashing must follow node identity.
    type Node: Clone + Eq + Hash + Debug;

    /// Returns the designated root container, or `None` while the host has
    /// not mounted it yet.
    fn root(&self) -> Option<Self::Node>;

    /// Returns the node's tag name, lowercased.
    fn tag(&self, node: &Self::Node) -> Cow<'_, str>;

    /// Returns `true` if the node carries an attribute named `name`.
    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool;

    /// Returns the node's parent, or `None` for a detached or top-level node.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Returns the node's element children in document order.
    fn children(&self, node: &Self::Node) -> impl Iterator<Item = Self::Node>;

    /// Applies (`true`) or removes (`false`) the hidden marker.
    ///
    /// Removing the marker from a node that does not carry it must have no
    /// observable effect.
    fn set_hidden(&mut self, node: &Self::Node, hidden: bool);

    /// Returns `true` if the node currently carries the hidden marker.
    fn is_hidden(&self, node: &Self::Node) -> bool;
}

/// Removes the hidden marker from `node`.
///
/// Idempotent: revealing a node that is already visible changes nothing.
#[inline]
pub fn reveal<T: VisualTree + ?Sized>(tree: &mut T, node: &T::Node) {
    tree.set_hidden(node, false);
}
