//! Relation filter combiner.
//!
//! Follows the `parentId` links from the root fragment down to the leaf and
//! wraps the leaf filter once per hop:
//!
//! ```text
//! condition-0 (5) ─► condition-1 (7) ─► condition-2 (9, "x" = 1)
//!
//! RELATED_LAYER(5, 7, RELATED_LAYER(7, 9, "x" = 1))
//! ```

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::compiler::RelatedFilterCombiner;
use crate::error::{CompileError, Result};
use crate::model::RelatedFilterFragment;

#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedLayerCombiner;

impl RelatedLayerCombiner {
    /// Root-to-leaf chain following declared parent links
    fn resolve_chain<'a>(
        &self,
        root_id: &str,
        fragments: &'a [RelatedFilterFragment],
    ) -> Result<Vec<&'a RelatedFilterFragment>> {
        let root = fragments
            .iter()
            .find(|f| f.data_id == root_id)
            .ok_or_else(|| broken(root_id, "root fragment not found"))?;

        let mut children: HashMap<&str, Vec<&RelatedFilterFragment>> = HashMap::new();
        for fragment in fragments {
            if let Some(parent_id) = fragment.parent_id.as_deref() {
                children.entry(parent_id).or_default().push(fragment);
            }
        }

        let mut chain = vec![root];
        let mut visited = HashSet::from([root.data_id.as_str()]);
        let mut current = root;

        while current.filter.is_none() {
            let next = match children.get(current.data_id.as_str()).map(Vec::as_slice) {
                Some([only]) => *only,
                Some([]) | None => return Err(broken(&current.data_id, "chain ends without a filter")),
                Some(_) => return Err(broken(&current.data_id, "fragment has more than one child")),
            };
            if !visited.insert(next.data_id.as_str()) {
                return Err(broken(&next.data_id, "cycle in parent links"));
            }
            chain.push(next);
            current = next;
        }

        Ok(chain)
    }
}

impl RelatedFilterCombiner for RelatedLayerCombiner {
    fn combine(&self, root_id: &str, fragments: &[RelatedFilterFragment]) -> Result<String> {
        let chain = self.resolve_chain(root_id, fragments)?;
        trace!(root_id, hops = chain.len() - 1, "Combining related filter");

        // resolve_chain stops at the first fragment with a filter
        let leaf = chain[chain.len() - 1];
        let mut filter = leaf.filter.clone().unwrap_or_default();

        for pair in chain.windows(2).rev() {
            let (parent, child) = (pair[0], pair[1]);
            match child.parent_feature_type {
                Some(parent_feature_type) if parent_feature_type == parent.feature_type => {
                    filter = format!(
                        "RELATED_LAYER({}, {}, {})",
                        parent_feature_type, child.feature_type, filter
                    );
                }
                _ => {
                    return Err(broken(
                        &child.data_id,
                        "parent feature type does not match the parent fragment",
                    ))
                }
            }
        }

        Ok(filter)
    }
}

fn broken(data_id: &str, message: &str) -> CompileError {
    CompileError::BrokenRelationChain {
        data_id: data_id.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::build_related_fragments;

    fn fragment(id: &str, parent: Option<(&str, i64)>, feature_type: i64, filter: Option<&str>) -> RelatedFilterFragment {
        RelatedFilterFragment {
            data_id: id.to_string(),
            parent_id: parent.map(|(p, _)| p.to_string()),
            feature_type,
            parent_feature_type: parent.map(|(_, ft)| ft),
            filter: filter.map(str::to_string),
        }
    }

    #[test]
    fn test_combine_chain() {
        let fragments = build_related_fragments("\"x\" = 1".to_string(), &[5, 7], 9);
        let filter = RelatedLayerCombiner.combine("condition-0", &fragments).unwrap();
        assert_eq!(filter, "RELATED_LAYER(5, 7, RELATED_LAYER(7, 9, \"x\" = 1))");
    }

    #[test]
    fn test_single_ancestor() {
        let fragments = build_related_fragments("a".to_string(), &[2], 3);
        let filter = RelatedLayerCombiner.combine("condition-0", &fragments).unwrap();
        assert_eq!(filter, "RELATED_LAYER(2, 3, a)");
    }

    #[test]
    fn test_fragment_order_does_not_matter() {
        let mut fragments = build_related_fragments("a".to_string(), &[5, 7], 9);
        fragments.reverse();
        let filter = RelatedLayerCombiner.combine("condition-0", &fragments).unwrap();
        assert_eq!(filter, "RELATED_LAYER(5, 7, RELATED_LAYER(7, 9, a))");
    }

    #[test]
    fn test_leaf_root_returns_filter() {
        let fragments = vec![fragment("condition-0", None, 9, Some("a"))];
        assert_eq!(RelatedLayerCombiner.combine("condition-0", &fragments).unwrap(), "a");
    }

    #[test]
    fn test_missing_root() {
        let fragments = build_related_fragments("a".to_string(), &[5], 9);
        let err = RelatedLayerCombiner.combine("condition-7", &fragments).unwrap_err();
        assert!(matches!(err, CompileError::BrokenRelationChain { data_id, .. } if data_id == "condition-7"));
    }

    #[test]
    fn test_chain_without_filter() {
        let fragments = vec![
            fragment("condition-0", None, 5, None),
            fragment("condition-1", Some(("condition-0", 5)), 7, None),
        ];
        let err = RelatedLayerCombiner.combine("condition-0", &fragments).unwrap_err();
        assert!(matches!(err, CompileError::BrokenRelationChain { data_id, .. } if data_id == "condition-1"));
    }

    #[test]
    fn test_branching_chain() {
        let fragments = vec![
            fragment("condition-0", None, 5, None),
            fragment("condition-1", Some(("condition-0", 5)), 7, Some("a")),
            fragment("condition-2", Some(("condition-0", 5)), 8, Some("b")),
        ];
        assert!(RelatedLayerCombiner.combine("condition-0", &fragments).is_err());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let fragments = vec![
            fragment("condition-0", Some(("condition-1", 7)), 5, None),
            fragment("condition-1", Some(("condition-0", 5)), 7, None),
        ];
        let err = RelatedLayerCombiner.combine("condition-0", &fragments).unwrap_err();
        assert!(matches!(err, CompileError::BrokenRelationChain { .. }));
    }

    #[test]
    fn test_mismatched_parent_feature_type() {
        let fragments = vec![
            fragment("condition-0", None, 5, None),
            fragment("condition-1", Some(("condition-0", 6)), 7, Some("a")),
        ];
        assert!(RelatedLayerCombiner.combine("condition-0", &fragments).is_err());
    }
}
