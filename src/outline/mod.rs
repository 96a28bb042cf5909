//! Outline parsing and serialization.
//!
//! An outline is plain text with one node per non-blank line. The leading
//! whitespace of a line sets its depth relative to the lines before it, and
//! a line may end with a jump annotation (see [`annotation`]) pointing at a
//! code block in a companion markdown document.
//!
//! ```text
//! Collections
//!   Lists >py[1]
//!     Slicing >py++
//!   Maps >py+=2
//! ```

pub mod annotation;
mod builder;
mod document;
pub mod node;
mod serialize;
pub mod stats;

pub use annotation::{Annotation, JumpCounters, JumpForm, LineContent, interpret_line};
pub use document::{EditError, Outline, OutlineIter};
pub use node::{EMPTY_NODE_PLACEHOLDER, Jump, NodeKey, OutlineNode};
pub use serialize::serialize_outline;
pub use stats::OutlineStats;

use builder::TreeBuilder;
use std::path::Path;

/// File extension used by outline documents.
pub const OUTLINE_EXTENSION: &str = "mgtree";

/// Parse an outline file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn parse_file(path: &Path) -> std::io::Result<Vec<OutlineNode>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_outline(&content))
}

/// Parse outline text into its root-level nodes.
///
/// Parsing never fails: lines that do not end in a valid annotation become
/// plain nodes, and any indentation is accepted. Jump counters live only for
/// the duration of this call, so every call resolves indices from scratch.
pub fn parse_outline(text: &str) -> Vec<OutlineNode> {
    let mut builder = TreeBuilder::new();
    let mut counters = JumpCounters::new();
    let mut next_key = 0u64;

    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let content = interpret_line(trimmed, &mut counters);
        builder.push(OutlineNode {
            key: NodeKey(next_key),
            title: content.title,
            level: leading_whitespace(line),
            original_text: trimmed.to_string(),
            jump: content.jump,
            children: Vec::new(),
        });
        next_key += 1;
    }

    let roots = builder.finish();
    tracing::debug!(nodes = next_key, roots = roots.len(), "parsed outline");
    roots
}

/// Count of whitespace characters before the first non-whitespace one.
/// Tabs count as one character.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Node shape without keys or source text, for structural comparison.
    #[derive(Debug, PartialEq)]
    struct Shape {
        title: String,
        level: usize,
        jump: Option<Jump>,
        children: Vec<Shape>,
    }

    fn shape(nodes: &[OutlineNode]) -> Vec<Shape> {
        nodes
            .iter()
            .map(|n| Shape {
                title: n.title.clone(),
                level: n.level,
                jump: n.jump.clone(),
                children: shape(&n.children),
            })
            .collect()
    }

    fn flatten(nodes: &[OutlineNode]) -> Vec<&OutlineNode> {
        let mut out = Vec::new();
        for node in nodes {
            out.push(node);
            out.extend(flatten(&node.children));
        }
        out
    }

    fn indices(text: &str) -> Vec<Option<u32>> {
        flatten(&parse_outline(text))
            .iter()
            .map(|n| n.jump_index())
            .collect()
    }

    #[test]
    fn test_blank_input_yields_empty_forest() {
        assert!(parse_outline("").is_empty());
        assert!(parse_outline("   \n\n").is_empty());
        assert!(parse_outline("\t\n \r\n").is_empty());
    }

    #[test]
    fn test_explicit_index_resets_counter() {
        assert_eq!(indices("a >py[5]\nb >py++\n"), vec![Some(5), Some(6)]);
    }

    #[test]
    fn test_jump_by_amount_accumulates() {
        assert_eq!(indices("a >go[1]\nb >go+=3\n"), vec![Some(1), Some(4)]);
    }

    #[test]
    fn test_repeat_same_does_not_advance() {
        assert_eq!(
            indices("a >js[2]\nb >js\nc >js\n"),
            vec![Some(2), Some(2), Some(2)]
        );
    }

    #[test]
    fn test_repeat_same_defaults_to_one() {
        assert_eq!(indices("a >rs\n"), vec![Some(1)]);
    }

    #[test]
    fn test_increment_defaults_from_zero() {
        assert_eq!(indices("a >py++\nb >py++\nc >py+=2"), vec![Some(1), Some(2), Some(4)]);
    }

    #[test]
    fn test_counters_are_per_language_and_case_sensitive() {
        let text = "a >py++\nb >go++\nc >py++\nd >PY++\ne >go\n";
        assert_eq!(
            indices(text),
            vec![Some(1), Some(1), Some(2), Some(1), Some(1)]
        );
    }

    #[test]
    fn test_counters_do_not_leak_between_parses() {
        assert_eq!(indices("a >py[7]"), vec![Some(7)]);
        assert_eq!(indices("a >py++"), vec![Some(1)]);
    }

    #[test]
    fn test_indentation_stack() {
        let text = "root\n  first\n    deep\n  second\nlast\n";
        let roots = parse_outline(text);

        assert_eq!(roots.len(), 2);
        assert_eq!(flatten(&roots).len(), 5);
        assert_eq!(roots[0].title, "root");
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(roots[0].children[0].title, "first");
        assert_eq!(roots[0].children[0].children[0].title, "deep");
        assert_eq!(roots[0].children[0].children[0].level, 4);
        assert_eq!(roots[0].children[1].title, "second");
        assert!(roots[0].children[1].children.is_empty());
        assert_eq!(roots[1].title, "last");
    }

    #[test]
    fn test_shallower_line_pops_several_frames() {
        let text = "a\n b\n  c\n   d\n e\n";
        let roots = parse_outline(text);
        assert_eq!(roots.len(), 1);
        let titles: Vec<_> = roots[0].children.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "e"]);
    }

    #[test]
    fn test_children_are_deeper_than_parents() {
        fn check(nodes: &[OutlineNode], parent_level: Option<usize>) {
            for node in nodes {
                if let Some(parent) = parent_level {
                    assert!(node.level > parent);
                }
                check(&node.children, Some(node.level));
            }
        }
        check(
            &parse_outline("a\n\tb\n\t\tc\n   d\n  e\n f\ng\n      h\n  i"),
            None,
        );
    }

    #[test]
    fn test_blank_lines_do_not_affect_structure() {
        let with_blanks = parse_outline("a\n\n  b\n   \n  c\n");
        let without = parse_outline("a\n  b\n  c\n");
        assert_eq!(shape(&with_blanks), shape(&without));
    }

    #[test]
    fn test_title_and_original_text() {
        let roots = parse_outline("   Print statement >java[3]  \n");
        let node = &roots[0];
        assert_eq!(node.title, "Print statement");
        assert_eq!(node.original_text, "Print statement >java[3]");
        assert_eq!(node.level, 3);
        assert_eq!(node.jump_language(), Some("java"));
        assert_eq!(node.jump_index(), Some(3));
    }

    #[test]
    fn test_line_without_marker_has_no_jump() {
        let roots = parse_outline("Plain title\nWith [brackets] and ++\nEquals += 3");
        assert!(flatten(&roots).iter().all(|n| !n.has_jump()));
    }

    #[test]
    fn test_near_miss_annotation_is_plain_text() {
        let roots = parse_outline("Compare a > b\nGeneric >py[x]\nMid >py++ text");
        for node in flatten(&roots) {
            assert!(!node.has_jump());
            assert_eq!(node.title, node.original_text);
        }
    }

    #[test]
    fn test_trailing_word_after_arrow_is_annotation() {
        let roots = parse_outline("Convert a->b");
        assert_eq!(roots[0].title, "Convert a-");
        assert_eq!(roots[0].jump_language(), Some("b"));
    }

    #[test]
    fn test_keys_are_unique_and_in_document_order() {
        let roots = parse_outline("a\n  b\n  c\nd");
        let keys: Vec<_> = flatten(&roots).iter().map(|n| n.key.to_string()).collect();
        assert_eq!(keys, vec!["node-0", "node-1", "node-2", "node-3"]);
    }

    #[test]
    fn test_crlf_input() {
        let roots = parse_outline("a >py[2]\r\n  b >py\r\n");
        assert_eq!(roots[0].original_text, "a >py[2]");
        assert_eq!(roots[0].children[0].title, "b");
        assert_eq!(roots[0].children[0].jump_index(), Some(2));
    }

    #[test]
    fn test_round_trip_canonical() {
        let text = "Basics >py[1]\n  Variables >py++\n    Scope >py\n  Loops >py+=2\nAdvanced\n  Traits >rs++\n";
        let first = parse_outline(text);
        let serialized = serialize_outline(&first);
        assert_eq!(serialized, text);
        assert_eq!(shape(&parse_outline(&serialized)), shape(&first));
    }

    #[test]
    fn test_round_trip_unusual_formatting_keeps_structure() {
        let text = "\tTabbed   >js[4]\n\t\t  Child>js++\n\n    Other\n";
        let first = parse_outline(text);
        let second = parse_outline(&serialize_outline(&first));

        fn strip_levels(shapes: &mut [Shape]) {
            for s in shapes {
                s.level = 0;
                strip_levels(&mut s.children);
            }
        }
        let mut a = shape(&first);
        let mut b = shape(&second);
        strip_levels(&mut a);
        strip_levels(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_placeholder_round_trip() {
        let mut roots = parse_outline("parent\n");
        let child_level = roots[0].level + 1;
        roots[0]
            .children
            .push(OutlineNode::empty(NodeKey(1), child_level));

        let text = serialize_outline(&roots);
        assert_eq!(text, format!("parent\n  {}\n", EMPTY_NODE_PLACEHOLDER));

        let reparsed = parse_outline(&text);
        assert_eq!(reparsed[0].children[0].title, "");
        assert_eq!(serialize_outline(&reparsed), text);
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mgtree");
        std::fs::write(&path, "a\n  b >py++\n").unwrap();

        let roots = parse_file(&path).unwrap();
        assert_eq!(roots[0].children[0].jump_index(), Some(1));
        assert!(parse_file(&dir.path().join("missing.mgtree")).is_err());
    }
}
