//! Outline serialization.

use super::node::{EMPTY_NODE_PLACEHOLDER, OutlineNode};

const INDENT: &str = "  ";

/// Write a forest back to outline text, depth-first pre-order.
///
/// A node with a known source line is written as that line verbatim under
/// a canonical two-space-per-depth indent, so annotations keep their written
/// form (`++` stays `++`). Other nodes are written as their title, or the
/// empty-node placeholder when the title is empty. Jump fields are never
/// used to rebuild an annotation.
pub fn serialize_outline(nodes: &[OutlineNode]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes, 0);
    tracing::debug!(bytes = out.len(), "serialized outline");
    out
}

fn write_nodes(out: &mut String, nodes: &[OutlineNode], depth: usize) {
    for node in nodes {
        for _ in 0..depth {
            out.push_str(INDENT);
        }

        if !node.original_text.is_empty() {
            out.push_str(&node.original_text);
        } else if !node.title.is_empty() {
            out.push_str(&node.title);
        } else {
            out.push_str(EMPTY_NODE_PLACEHOLDER);
        }
        out.push('\n');

        write_nodes(out, &node.children, depth + 1);
    }
}
