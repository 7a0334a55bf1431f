// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Classification of freshly inserted subtrees.
//!
//! Every node in an inserted subtree gets one of three [`Verdict`]s:
//!
//! - [`Verdict::Reject`] — the node carries the ignore attribute. Neither it
//!   nor anything below it is enqueued, and the walk does not descend.
//! - [`Verdict::Skip`] — the node is the root container or a structural or
//!   non-visual tag. It is not enqueued, but its children are still visited.
//! - [`Verdict::Accept`] — the node is enqueued.
//!
//! Before a walk starts, [`is_ignored_within`] checks once, upward, whether
//! the inserted node sits below an ignore-marked ancestor; in that case the
//! whole insertion is rejected without visiting anything.

use alloc::vec::Vec;

use crate::node::VisualTree;

/// Attribute that opts a node and its subtree out of throttling.
pub const IGNORE_ATTRIBUTE: &str = "data-trickle-ignore";

/// Tags that are never hidden themselves: document structure and non-visual
/// resources.
pub const EXCLUDED_TAGS: &[&str] = &[
    "html", "head", "body", "script", "style", "link", "meta", "title", "base", "noscript",
    "template",
];

/// Pending-store size at which the overflow guard reveals everything.
pub const OVERFLOW_THRESHOLD: usize = 4000;

/// Rules applied by the intake filter and the overflow guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntakeRules {
    /// Attribute whose presence rejects a node's whole subtree.
    pub ignore_attribute: &'static str,
    /// Lowercase tag names that are skipped but descended into.
    pub excluded_tags: &'static [&'static str],
    /// Pending count at which the overflow guard fires.
    pub overflow_threshold: usize,
}

impl IntakeRules {
    /// The standard rules: [`IGNORE_ATTRIBUTE`], [`EXCLUDED_TAGS`] and
    /// [`OVERFLOW_THRESHOLD`].
    pub const DEFAULT: Self = Self {
        ignore_attribute: IGNORE_ATTRIBUTE,
        excluded_tags: EXCLUDED_TAGS,
        overflow_threshold: OVERFLOW_THRESHOLD,
    };

    /// Returns `true` if `tag` is in the excluded set.
    #[must_use]
    pub fn is_excluded_tag(&self, tag: &str) -> bool {
        self.excluded_tags.contains(&tag)
    }
}

impl Default for IntakeRules {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-node outcome of intake classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Enqueue the node and visit its children.
    Accept,
    /// Do not enqueue the node, but visit its children.
    Skip,
    /// Do not enqueue the node or anything below it.
    Reject,
}

/// Counts of verdicts reached during one intake batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntakeCounts {
    /// Nodes accepted (including ones that were already pending).
    pub accepted: u32,
    /// Nodes skipped while descending.
    pub skipped: u32,
    /// Subtree roots rejected, including insertions rejected by the upward
    /// check.
    pub rejected: u32,
}

impl IntakeCounts {
    fn record(&mut self, verdict: Verdict) {
        let slot = match verdict {
            Verdict::Accept => &mut self.accepted,
            Verdict::Skip => &mut self.skipped,
            Verdict::Reject => &mut self.rejected,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Classifies one node, looking only at the node itself.
///
/// `root` is the container as resolved by the caller, so a walk queries the
/// tree for it once rather than per node.
pub fn classify<T: VisualTree>(
    tree: &T,
    rules: &IntakeRules,
    root: Option<&T::Node>,
    node: &T::Node,
) -> Verdict {
    if tree.has_attribute(node, rules.ignore_attribute) {
        return Verdict::Reject;
    }
    if root == Some(node) || rules.is_excluded_tag(&tree.tag(node)) {
        return Verdict::Skip;
    }
    Verdict::Accept
}

/// Returns `true` if `node` or any of its ancestors carries the ignore
/// attribute.
pub fn is_ignored_within<T: VisualTree>(tree: &T, rules: &IntakeRules, node: &T::Node) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if tree.has_attribute(&n, rules.ignore_attribute) {
            return true;
        }
        current = tree.parent(&n);
    }
    false
}

/// Walks the subtree rooted at `start` in document order, calling `visit`
/// for every node that is not inside a rejected branch.
///
/// `visit` receives each node with its [`Verdict`]; the walk itself honors
/// `Reject` by not descending. An explicit stack keeps deep trees off the
/// call stack.
pub fn walk<T, F>(
    tree: &T,
    rules: &IntakeRules,
    root: Option<&T::Node>,
    start: &T::Node,
    mut visit: F,
) where
    T: VisualTree,
    F: FnMut(&T::Node, Verdict),
{
    let mut stack: Vec<T::Node> = Vec::new();
    stack.push(start.clone());
    while let Some(node) = stack.pop() {
        let verdict = classify(tree, rules, root, &node);
        visit(&node, verdict);
        if verdict == Verdict::Reject {
            continue;
        }
        // Children are pushed reversed so the first child pops first.
        let first = stack.len();
        stack.extend(tree.children(&node));
        stack[first..].reverse();
    }
}

/// Collects the nodes of one inserted subtree that should be enqueued.
///
/// Applies the upward ignore check first. Accepted nodes are appended to
/// `out` in document order and every verdict is tallied in `counts`.
pub fn collect<T: VisualTree>(
    tree: &T,
    rules: &IntakeRules,
    root: Option<&T::Node>,
    inserted: &T::Node,
    out: &mut Vec<T::Node>,
    counts: &mut IntakeCounts,
) {
    if is_ignored_within(tree, rules, inserted) {
        counts.record(Verdict::Reject);
        return;
    }
    walk(tree, rules, root, inserted, |node, verdict| {
        counts.record(verdict);
        if verdict == Verdict::Accept {
            out.push(node.clone());
        }
    });
}
