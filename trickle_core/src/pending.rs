// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The set of nodes awaiting reveal.
//!
//! [`PendingStore`] pairs a membership set with an insertion-ordered stack.
//! Both live behind private fields and only change together, so
//! `set.len() == order.len()` holds after every public call and a node occurs
//! in the order at most once.
//!
//! # Drain order
//!
//! [`drain_next`](PendingStore::drain_next) is last-in-first-out: the most
//! recent insertion is revealed first, so the newest UI change appears
//! soonest. Under sustained churn a node enqueued early can wait for as long
//! as newer nodes keep arriving ahead of it; the overflow guard bounds that
//! wait by size, not by age.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::node::VisualTree;

/// Nodes that carry the hidden marker and wait for a flush.
#[derive(Clone)]
pub struct PendingStore<N> {
    members: HashSet<N>,
    order: Vec<N>,
}

impl<N> core::fmt::Debug for PendingStore<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingStore")
            .field("len", &self.order.len())
            .finish_non_exhaustive()
    }
}

impl<N> Default for PendingStore<N> {
    fn default() -> Self {
        Self {
            members: HashSet::new(),
            order: Vec::new(),
        }
    }
}

impl<N: Clone + Eq + core::hash::Hash> PendingStore<N> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hides `node` and appends it, unless it is already pending.
    ///
    /// Returns `true` if the node was newly added.
    pub fn enqueue<T>(&mut self, tree: &mut T, node: N) -> bool
    where
        T: VisualTree<Node = N> + ?Sized,
    {
        if self.members.contains(&node) {
            return false;
        }
        tree.set_hidden(&node, true);
        self.members.insert(node.clone());
        self.order.push(node);
        true
    }

    /// Removes and returns the most recently enqueued node.
    pub fn drain_next(&mut self) -> Option<N> {
        let node = self.order.pop()?;
        self.members.remove(&node);
        Some(node)
    }

    /// Empties the store, returning every pending node, newest first.
    pub fn clear_all(&mut self) -> Vec<N> {
        self.members.clear();
        let mut all = core::mem::take(&mut self.order);
        all.reverse();
        all
    }

    /// Returns `true` if `node` is pending.
    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        self.members.contains(node)
    }

    /// Returns the number of pending nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(
            self.members.len(),
            self.order.len(),
            "pending set and order out of step"
        );
        self.order.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates pending nodes from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &N> {
        self.order.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::vec;

    use super::*;

    /// Flat tree of `u32` handles with one hidden flag per handle.
    #[derive(Default)]
    struct Flags {
        hidden: Vec<bool>,
        writes: u32,
    }

    impl VisualTree for Flags {
        type Node = u32;

        fn root(&self) -> Option<u32> {
            None
        }

        fn tag(&self, _node: &u32) -> Cow<'_, str> {
            Cow::Borrowed("div")
        }

        fn has_attribute(&self, _node: &u32, _name: &str) -> bool {
            false
        }

        fn parent(&self, _node: &u32) -> Option<u32> {
            None
        }

        fn children(&self, _node: &u32) -> impl Iterator<Item = u32> {
            core::iter::empty()
        }

        fn set_hidden(&mut self, node: &u32, hidden: bool) {
            let idx = *node as usize;
            if self.hidden.len() <= idx {
                self.hidden.resize(idx + 1, false);
            }
            self.hidden[idx] = hidden;
            self.writes += 1;
        }

        fn is_hidden(&self, node: &u32) -> bool {
            self.hidden.get(*node as usize).copied().unwrap_or(false)
        }
    }

    #[test]
    fn enqueue_hides_and_dedups() {
        let mut tree = Flags::default();
        let mut store = PendingStore::new();

        assert!(store.enqueue(&mut tree, 3), "first enqueue adds");
        assert!(!store.enqueue(&mut tree, 3), "second enqueue is a no-op");
        assert_eq!(store.len(), 1);
        assert!(tree.is_hidden(&3));
        assert_eq!(tree.writes, 1, "duplicate enqueue must not touch the tree");
    }

    #[test]
    fn drain_is_last_in_first_out() {
        let mut tree = Flags::default();
        let mut store = PendingStore::new();
        for n in [1, 2, 3] {
            store.enqueue(&mut tree, n);
        }

        assert_eq!(store.drain_next(), Some(3));
        assert_eq!(store.drain_next(), Some(2));
        assert!(!store.contains(&2), "drained node leaves the set too");
        assert_eq!(store.len(), 1);
        assert_eq!(store.drain_next(), Some(1));
        assert_eq!(store.drain_next(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn re_enqueue_after_drain_is_allowed() {
        let mut tree = Flags::default();
        let mut store = PendingStore::new();
        store.enqueue(&mut tree, 7);
        assert_eq!(store.drain_next(), Some(7));
        assert!(store.enqueue(&mut tree, 7), "drained node can come back");
        assert_eq!(store.iter().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn clear_all_returns_newest_first_and_empties() {
        let mut tree = Flags::default();
        let mut store = PendingStore::new();
        for n in [10, 11, 12] {
            store.enqueue(&mut tree, n);
        }

        assert_eq!(store.clear_all(), vec![12, 11, 10]);
        assert!(store.is_empty());
        assert!(!store.contains(&10), "membership cleared with order");
        assert!(store.enqueue(&mut tree, 10), "store usable after clear");
    }

    #[test]
    fn interleaved_operations_keep_set_and_order_in_step() {
        let mut tree = Flags::default();
        let mut store = PendingStore::new();
        let ops: [(bool, u32); 9] = [
            (true, 1),
            (true, 2),
            (true, 1),
            (false, 0),
            (true, 2),
            (true, 3),
            (false, 0),
            (true, 3),
            (true, 4),
        ];
        for (push, n) in ops {
            if push {
                store.enqueue(&mut tree, n);
            } else {
                store.drain_next();
            }
            let ordered: Vec<u32> = store.iter().copied().collect();
            assert_eq!(ordered.len(), store.members.len(), "sizes agree");
            for n in &ordered {
                assert_eq!(
                    ordered.iter().filter(|m| *m == n).count(),
                    1,
                    "{n} appears once"
                );
            }
        }
        assert_eq!(store.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
