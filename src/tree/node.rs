//! The in-memory secret tree.
//!
//! Every node owns its children outright (`BTreeMap<String, Node>`), so
//! the structure is a strict hierarchy with no shared or back pointers.
//! Values are stored as opaque encrypted blobs; nothing in this module
//! ever sees plaintext.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use zeroize::Zeroize;

use super::path;
use crate::errors::{KeyTreeError, Result};

/// One path segment in the tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Node {
    value: Option<Vec<u8>>,
    children: BTreeMap<String, Node>,
}

impl Node {
    /// The encrypted value held by this node, if any.
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Replace the stored blob, wiping the previous one.
    pub fn set_value(&mut self, blob: Vec<u8>) {
        self.clear_value();
        self.value = Some(blob);
    }

    /// Drop the stored blob, wiping it first.
    pub fn clear_value(&mut self) {
        if let Some(mut old) = self.value.take() {
            old.zeroize();
        }
    }

    pub fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }

    pub fn child(&self, label: &str) -> Option<&Node> {
        self.children.get(label)
    }

    /// Attach `child` under `label`, replacing any previous subtree.
    pub fn insert_child(&mut self, label: String, child: Node) {
        self.children.insert(label, child);
    }

    /// Neither a value nor children: a prune candidate.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }

    /// Recursively wipe every value below (and including) this node.
    pub fn wipe(&mut self) {
        self.clear_value();
        for child in self.children.values_mut() {
            child.wipe();
        }
        self.children.clear();
    }

    /// Remove every empty child edge of this node, then recurse into
    /// the surviving children.  Returns the number of edges removed.
    fn prune_pass(&mut self) -> usize {
        let before = self.children.len();
        self.children.retain(|_, child| !child.is_empty());
        let mut removed = before - self.children.len();
        for child in self.children.values_mut() {
            removed += child.prune_pass();
        }
        removed
    }

    fn count(&self) -> usize {
        self.children.values().map(|c| 1 + c.count()).sum()
    }
}

/// The hierarchical tree of secrets.  The root is unlabeled and never
/// removed.
#[derive(Debug, Default)]
pub struct SecretTree {
    root: Node,
}

impl SecretTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-built root node.
    pub fn from_root(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of reachable non-root nodes.
    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Resolve `path` to a node without creating anything.
    pub fn descendant(&self, path: &str) -> Result<Option<&Node>> {
        let mut node = &self.root;
        for segment in path::split(path)? {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// Resolve `path` to a mutable node.
    ///
    /// With `create`, missing segments are materialized as empty nodes
    /// and the result is always `Some`.
    pub fn descendant_mut(&mut self, path: &str, create: bool) -> Result<Option<&mut Node>> {
        let segments = path::split(path)?;
        let mut node = &mut self.root;
        for segment in segments {
            if create {
                node = node.children.entry(segment.to_string()).or_default();
            } else {
                match node.children.get_mut(segment) {
                    Some(child) => node = child,
                    None => return Ok(None),
                }
            }
        }
        Ok(Some(node))
    }

    /// Detach the edge leading to `path` from its parent.
    ///
    /// Does not recurse: the whole subtree is returned to the caller
    /// and is no longer reachable from the tree.
    pub fn remove(&mut self, path: &str) -> Result<Node> {
        let segments = path::split(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| KeyTreeError::InvalidPath(path.to_string()))?;

        let mut parent = &mut self.root;
        for segment in parents {
            parent = parent
                .children
                .get_mut(*segment)
                .ok_or_else(|| KeyTreeError::PathNotFound(path.to_string()))?;
        }
        parent
            .children
            .remove(*last)
            .ok_or_else(|| KeyTreeError::PathNotFound(path.to_string()))
    }

    /// Remove valueless, childless nodes until a full scan removes
    /// nothing.  Returns the total number of nodes removed.
    ///
    /// Each scan only drops nodes that are empty at that moment, so a
    /// chain of now-empty ancestors takes one scan per level.  Worst
    /// case is quadratic in tree size.
    pub fn prune(&mut self) -> usize {
        let mut total = 0;
        loop {
            let removed = self.root.prune_pass();
            if removed == 0 {
                return total;
            }
            total += removed;
        }
    }

    /// Depth-first, label-ordered traversal of every non-root node.
    pub fn iter(&self) -> Iter<'_> {
        let mut stack = Vec::new();
        push_children(&mut stack, "", &self.root);
        Iter { stack }
    }

    /// Skeleton view: one line per node, two spaces of indent per level.
    /// Nodes holding a value end in ` *`, the rest end in `/`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in self.iter() {
            let indent = "  ".repeat(entry.depth);
            let marker = if entry.value.is_some() { " *" } else { "/" };
            let _ = writeln!(out, "{indent}{}{marker}", entry.label());
        }
        out
    }

    /// Wipe every stored blob and drop all nodes.
    pub fn wipe(&mut self) {
        self.root.wipe();
    }
}

impl Drop for SecretTree {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// One node yielded by [`SecretTree::iter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    /// Full slash-joined path from the root.
    pub path: String,
    /// Still-encrypted value, if the node holds one.
    pub value: Option<&'a [u8]>,
    /// Zero for children of the root.
    pub depth: usize,
    /// Whether the node has any children.
    pub has_children: bool,
}

impl Entry<'_> {
    /// Last segment of the path.
    pub fn label(&self) -> &str {
        self.path
            .rsplit(path::SEPARATOR)
            .next()
            .unwrap_or(self.path.as_str())
    }
}

/// Iterator returned by [`SecretTree::iter`].
pub struct Iter<'a> {
    stack: Vec<(String, usize, &'a Node)>,
}

fn push_children<'a>(stack: &mut Vec<(String, usize, &'a Node)>, prefix: &str, node: &'a Node) {
    let depth = if prefix.is_empty() {
        0
    } else {
        prefix.matches(path::SEPARATOR).count() + 1
    };
    // Reverse so the smallest label is popped first.
    for (label, child) in node.children.iter().rev() {
        stack.push((path::join(prefix, label), depth, child));
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (full_path, depth, node) = self.stack.pop()?;
        push_children(&mut self.stack, &full_path, node);
        Some(Entry {
            value: node.value(),
            depth,
            has_children: !node.children.is_empty(),
            path: full_path,
        })
    }
}
