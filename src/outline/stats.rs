//! Outline statistics.

use super::document::OutlineIter;
use super::node::OutlineNode;
use indexmap::IndexMap;
use serde::Serialize;

/// Summary counts for an outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineStats {
    pub node_count: usize,
    pub root_count: usize,
    /// Number of levels in the tree; 1 when there are only root nodes
    pub max_depth: usize,
    pub jump_count: usize,
    pub empty_count: usize,
    /// Jump nodes per language token, in first-seen order
    pub languages: IndexMap<String, usize>,
}

impl OutlineStats {
    pub fn from_nodes(nodes: &[OutlineNode]) -> Self {
        let mut stats = OutlineStats {
            root_count: nodes.len(),
            ..Default::default()
        };

        for (depth, node) in OutlineIter::new(nodes) {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(depth + 1);
            if node.title.is_empty() {
                stats.empty_count += 1;
            }
            if let Some(jump) = &node.jump {
                stats.jump_count += 1;
                *stats.languages.entry(jump.language.clone()).or_insert(0) += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::parse_outline;

    #[test]
    fn test_stats() {
        let nodes = parse_outline("a >rs[1]\n  b >py++\n    c >rs++\n  d\ne >py\n");
        let stats = OutlineStats::from_nodes(&nodes);

        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.root_count, 2);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.jump_count, 4);
        assert_eq!(stats.empty_count, 0);
        let langs: Vec<_> = stats.languages.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(langs, vec![("rs", 2), ("py", 2)]);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(OutlineStats::from_nodes(&[]), OutlineStats::default());
    }

    #[test]
    fn test_stats_json() {
        let stats = OutlineStats::from_nodes(&parse_outline("a >go++"));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["nodeCount"], 1);
        assert_eq!(json["languages"]["go"], 1);
    }
}
