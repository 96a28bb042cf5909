//! Outline node types.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;

/// Title written for nodes whose title is empty.
///
/// Blank lines are dropped by the parser, so an empty node is persisted as
/// this literal and normalized back to an empty title when loaded.
pub const EMPTY_NODE_PLACEHOLDER: &str = "(空节点)";

/// Unique identifier of a node within one forest, displayed as `node-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

impl std::str::FromStr for NodeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("node-").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(NodeKey)
            .map_err(|_| format!("Invalid node key: '{}' (expected node-<n>)", s))
    }
}

impl Serialize for NodeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved jump target: the `index`-th code block tagged `language`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Jump {
    /// Language token exactly as written in the annotation
    pub language: String,
    /// 1-based position within that language's code blocks
    pub index: u32,
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.language, self.index)
    }
}

/// One outline entry, corresponding to one non-blank source line.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    pub key: NodeKey,
    /// Display text without the jump annotation
    pub title: String,
    /// Leading whitespace count of the source line
    pub level: usize,
    /// Trimmed source line, annotation included. Empty for nodes created
    /// interactively and never given text.
    pub original_text: String,
    pub jump: Option<Jump>,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// Create an empty node with no source line.
    pub fn empty(key: NodeKey, level: usize) -> Self {
        Self {
            key,
            title: String::new(),
            level,
            original_text: String::new(),
            jump: None,
            children: Vec::new(),
        }
    }

    pub fn has_jump(&self) -> bool {
        self.jump.is_some()
    }

    pub fn jump_language(&self) -> Option<&str> {
        self.jump.as_ref().map(|j| j.language.as_str())
    }

    pub fn jump_index(&self) -> Option<u32> {
        self.jump.as_ref().map(|j| j.index)
    }

    /// Title as shown to users; empty titles show the placeholder.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            EMPTY_NODE_PLACEHOLDER
        } else {
            &self.title
        }
    }

    /// Number of nodes in this subtree, including this node.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }

    /// Render this node and its descendants with box-drawing characters.
    pub fn render_box_tree(&self, prefix: &str, is_last: bool) -> String {
        let mut result = String::new();

        let connector = if is_last { "└── " } else { "├── " };
        result.push_str(prefix);
        result.push_str(connector);
        result.push_str(self.display_title());
        if let Some(jump) = &self.jump {
            result.push_str(&format!("  → {}", jump));
        }
        result.push('\n');

        let child_prefix = if is_last {
            format!("{}    ", prefix)
        } else {
            format!("{}│   ", prefix)
        };

        for (i, child) in self.children.iter().enumerate() {
            let child_is_last = i == self.children.len() - 1;
            result.push_str(&child.render_box_tree(&child_prefix, child_is_last));
        }

        result
    }
}

// JSON keeps the flat `hasJump` / `jumpLanguage` / `jumpIndex` shape used by
// the outline tooling rather than a nested jump object.
impl Serialize for OutlineNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OutlineNode", 8)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("level", &self.level)?;
        state.serialize_field("originalText", &self.original_text)?;
        state.serialize_field("hasJump", &self.has_jump())?;
        state.serialize_field("jumpLanguage", &self.jump_language())?;
        state.serialize_field("jumpIndex", &self.jump_index())?;
        state.serialize_field("children", &self.children)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: u64, title: &str) -> OutlineNode {
        OutlineNode {
            title: title.to_string(),
            original_text: title.to_string(),
            ..OutlineNode::empty(NodeKey(key), 0)
        }
    }

    #[test]
    fn test_node_key_display_and_parse() {
        assert_eq!(NodeKey(7).to_string(), "node-7");
        assert_eq!("node-7".parse::<NodeKey>(), Ok(NodeKey(7)));
        assert_eq!("12".parse::<NodeKey>(), Ok(NodeKey(12)));
        assert!("node-x".parse::<NodeKey>().is_err());
    }

    #[test]
    fn test_display_title_uses_placeholder() {
        let node = OutlineNode::empty(NodeKey(0), 0);
        assert_eq!(node.display_title(), EMPTY_NODE_PLACEHOLDER);
        assert_eq!(leaf(1, "Intro").display_title(), "Intro");
    }

    #[test]
    fn test_render_box_tree() {
        let mut root = leaf(0, "Root");
        let mut child = leaf(1, "Child");
        child.jump = Some(Jump {
            language: "py".to_string(),
            index: 2,
        });
        root.children.push(child);
        root.children.push(leaf(2, "Last"));

        let rendered = root.render_box_tree("", true);
        assert_eq!(
            rendered,
            "└── Root\n    ├── Child  → py#2\n    └── Last\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let mut node = leaf(3, "Loop");
        node.jump = Some(Jump {
            language: "go".to_string(),
            index: 4,
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["key"], "node-3");
        assert_eq!(json["hasJump"], true);
        assert_eq!(json["jumpLanguage"], "go");
        assert_eq!(json["jumpIndex"], 4);
        assert_eq!(json["originalText"], "Loop");

        let plain = serde_json::to_value(leaf(4, "Plain")).unwrap();
        assert_eq!(plain["hasJump"], false);
        assert!(plain["jumpLanguage"].is_null());
        assert!(plain["jumpIndex"].is_null());
    }
}
