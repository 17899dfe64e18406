//! Parent-labeled tree assembly

use std::collections::HashSet;

use crate::error::HierarchyError;
use crate::models::{AggregateNode, NodeKey, TreeNode, UtilizationView};

/// Assemble the tree for the chosen utilization view
///
/// Requires exactly one root, unique labels and a parent for every other
/// node; violations are returned as errors rather than dropped.
pub fn build_tree(
    nodes: &[AggregateNode],
    view: UtilizationView,
) -> Result<Vec<TreeNode>, HierarchyError> {
    let roots = nodes.iter().filter(|n| n.key == NodeKey::Root).count();
    if roots != 1 {
        return Err(HierarchyError::RootCount(roots));
    }

    let mut labels = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !labels.insert(node.label.as_str()) {
            return Err(HierarchyError::DuplicateLabel(node.label.clone()));
        }
    }

    nodes
        .iter()
        .map(|node| {
            if !node.parent_label.is_empty() && !labels.contains(node.parent_label.as_str()) {
                return Err(HierarchyError::MissingParent {
                    label: node.label.clone(),
                    parent_label: node.parent_label.clone(),
                });
            }

            let utilization_pct = match view {
                UtilizationView::Simple => node.simple_avg_utilization_pct,
                UtilizationView::Weighted => node.weighted_avg_utilization_pct,
            };

            Ok(TreeNode {
                label: node.label.clone(),
                name: node.name.clone(),
                parent_label: node.parent_label.clone(),
                level: node.level(),
                total_capacity: node.total_capacity,
                used_capacity: node.used_capacity,
                available_capacity: node.available_capacity,
                utilization_pct,
            })
        })
        .collect()
}
