//! Editable outline forest with stable node keys.

use super::annotation::{JumpCounters, interpret_line};
use super::node::{NodeKey, OutlineNode};
use super::stats::OutlineStats;
use super::{parse_outline, serialize_outline};

/// Errors from editing an [`Outline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// No node with this key exists in the outline
    NodeNotFound(NodeKey),
    /// Node text was empty after trimming
    EmptyText,
    /// Node text spanned more than one line
    MultiLineText,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::NodeNotFound(key) => write!(f, "Node not found: {}", key),
            EditError::EmptyText => write!(f, "Node text cannot be empty"),
            EditError::MultiLineText => write!(f, "Node text must be a single line"),
        }
    }
}

impl std::error::Error for EditError {}

/// An editable outline forest.
///
/// Owns the parsed nodes plus the key counter, so keys handed out by edits
/// never collide with parsed keys or with keys of deleted nodes.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    nodes: Vec<OutlineNode>,
    next_key: u64,
}

impl Outline {
    /// Parse outline text into a fresh forest.
    pub fn parse(text: &str) -> Self {
        Self::from_nodes(parse_outline(text))
    }

    pub fn from_nodes(nodes: Vec<OutlineNode>) -> Self {
        let next_key = OutlineIter::new(&nodes)
            .map(|(_, node)| node.key.0 + 1)
            .max()
            .unwrap_or(0);
        Self { nodes, next_key }
    }

    /// Root-level nodes.
    pub fn nodes(&self) -> &[OutlineNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<OutlineNode> {
        self.nodes
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(OutlineNode::subtree_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate every node in pre-order together with its depth (roots at 0).
    pub fn iter(&self) -> OutlineIter<'_> {
        OutlineIter::new(&self.nodes)
    }

    pub fn find(&self, key: NodeKey) -> Option<&OutlineNode> {
        self.iter().map(|(_, node)| node).find(|node| node.key == key)
    }

    pub fn find_mut(&mut self, key: NodeKey) -> Option<&mut OutlineNode> {
        find_in_mut(&mut self.nodes, key)
    }

    /// Nodes whose title contains `pattern`, case-insensitively, in pre-order.
    pub fn filter(&self, pattern: &str) -> Vec<&OutlineNode> {
        let pattern_lower = pattern.to_lowercase();
        self.iter()
            .map(|(_, node)| node)
            .filter(|node| node.title.to_lowercase().contains(&pattern_lower))
            .collect()
    }

    /// Append an empty node as the last child of `parent`, or as the last
    /// root node when `parent` is `None`. Returns the new node's key.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NodeNotFound`] if `parent` does not exist.
    pub fn add_child(&mut self, parent: Option<NodeKey>) -> Result<NodeKey, EditError> {
        let key = NodeKey(self.next_key);

        match parent {
            None => self.nodes.push(OutlineNode::empty(key, 0)),
            Some(parent_key) => {
                let parent = self
                    .find_mut(parent_key)
                    .ok_or(EditError::NodeNotFound(parent_key))?;
                let level = parent.level + 1;
                parent.children.push(OutlineNode::empty(key, level));
            }
        }

        self.next_key += 1;
        tracing::debug!(%key, parent = ?parent.map(|k| k.to_string()), "added node");
        Ok(key)
    }

    /// Replace a node's text.
    ///
    /// The trimmed text becomes the node's source line; title and jump are
    /// derived from it with the annotation grammar, then every jump index in
    /// the outline is resolved again so later `++`/`+=` lines stay in step.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or the text is empty or
    /// spans several lines.
    pub fn rename(&mut self, key: NodeKey, text: &str) -> Result<(), EditError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EditError::EmptyText);
        }
        if text.contains(['\n', '\r']) {
            return Err(EditError::MultiLineText);
        }

        let node = self.find_mut(key).ok_or(EditError::NodeNotFound(key))?;
        node.original_text = text.to_string();
        self.resolve_jumps();
        Ok(())
    }

    /// Remove a node together with its subtree and return it.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NodeNotFound`] if the node does not exist.
    pub fn remove(&mut self, key: NodeKey) -> Result<OutlineNode, EditError> {
        let removed = remove_from(&mut self.nodes, key).ok_or(EditError::NodeNotFound(key))?;
        self.resolve_jumps();
        tracing::debug!(%key, subtree = removed.subtree_len(), "removed node");
        Ok(removed)
    }

    /// Recompute titles and jump indices from each node's source line, in
    /// document order with fresh counters.
    ///
    /// Afterwards the forest matches what parsing its own serialization
    /// would produce. Nodes without a source line are left untouched.
    pub fn resolve_jumps(&mut self) {
        let mut counters = JumpCounters::new();
        resolve_in(&mut self.nodes, &mut counters);
    }

    pub fn serialize(&self) -> String {
        serialize_outline(&self.nodes)
    }

    pub fn stats(&self) -> OutlineStats {
        OutlineStats::from_nodes(&self.nodes)
    }

    /// Render the whole forest as a box-drawing tree.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let is_last = i == self.nodes.len() - 1;
            out.push_str(&node.render_box_tree("", is_last));
        }
        out
    }
}

fn find_in_mut(nodes: &mut [OutlineNode], key: NodeKey) -> Option<&mut OutlineNode> {
    for node in nodes.iter_mut() {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.children, key) {
            return Some(found);
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<OutlineNode>, key: NodeKey) -> Option<OutlineNode> {
    if let Some(pos) = nodes.iter().position(|node| node.key == key) {
        return Some(nodes.remove(pos));
    }
    nodes
        .iter_mut()
        .find_map(|node| remove_from(&mut node.children, key))
}

fn resolve_in(nodes: &mut [OutlineNode], counters: &mut JumpCounters) {
    for node in nodes {
        if !node.original_text.is_empty() {
            let content = interpret_line(&node.original_text, counters);
            node.title = content.title;
            node.jump = content.jump;
        }
        resolve_in(&mut node.children, counters);
    }
}

/// Pre-order iterator over an outline, yielding `(depth, node)`.
pub struct OutlineIter<'a> {
    stack: Vec<(usize, &'a OutlineNode)>,
}

impl<'a> OutlineIter<'a> {
    pub fn new(nodes: &'a [OutlineNode]) -> Self {
        Self {
            stack: nodes.iter().rev().map(|node| (0, node)).collect(),
        }
    }
}

impl<'a> Iterator for OutlineIter<'a> {
    type Item = (usize, &'a OutlineNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}
