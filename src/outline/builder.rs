//! Indentation-driven tree assembly.
//!
//! Nodes arrive in document order. The builder keeps the path of open nodes
//! from the root to the most recent node; a node at equal or lower
//! indentation closes everything at or above its level before it opens.

use super::node::OutlineNode;

#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    roots: Vec<OutlineNode>,
    open: Vec<OutlineNode>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: OutlineNode) {
        while self
            .open
            .last()
            .is_some_and(|top| top.level >= node.level)
        {
            self.close_top();
        }
        self.open.push(node);
    }

    pub(crate) fn finish(mut self) -> Vec<OutlineNode> {
        while !self.open.is_empty() {
            self.close_top();
        }
        self.roots
    }

    fn close_top(&mut self) {
        if let Some(done) = self.open.pop() {
            match self.open.last_mut() {
                Some(parent) => parent.children.push(done),
                None => self.roots.push(done),
            }
        }
    }
}
