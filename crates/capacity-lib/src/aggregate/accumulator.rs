//! Running capacity totals for one group

use crate::models::{utilization_pct, AggregateNode};

/// Sums needed for both the simple and the weighted average
///
/// Accumulators merge upward: pool totals feed tenant totals, tenant totals
/// feed system totals, and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapacityAccumulator {
    pub total_capacity: f64,
    pub used_capacity: f64,
    /// Sum of each member's own utilization percentage
    utilization_sum: f64,
    pub members: usize,
}

impl CapacityAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one leaf entity
    pub fn add_member(&mut self, total: f64, used: f64) {
        self.total_capacity += total;
        self.used_capacity += used;
        self.utilization_sum += utilization_pct(used, total);
        self.members += 1;
    }

    /// Fold a child group into this one
    pub fn merge(&mut self, child: &CapacityAccumulator) {
        self.total_capacity += child.total_capacity;
        self.used_capacity += child.used_capacity;
        self.utilization_sum += child.utilization_sum;
        self.members += child.members;
    }

    pub fn utilization_sum(&self) -> f64 {
        self.utilization_sum
    }

    pub fn available_capacity(&self) -> f64 {
        self.total_capacity - self.used_capacity
    }

    /// Mean of member utilizations, 0 for an empty group
    pub fn simple_avg_pct(&self) -> f64 {
        if self.members == 0 {
            0.0
        } else {
            self.utilization_sum / self.members as f64
        }
    }

    /// Total used over total capacity, 0 when the group has no capacity
    pub fn weighted_avg_pct(&self) -> f64 {
        utilization_pct(self.used_capacity, self.total_capacity)
    }
}

impl From<&AggregateNode> for CapacityAccumulator {
    /// Rebuild the running sums of an already aggregated group
    fn from(node: &AggregateNode) -> Self {
        Self {
            total_capacity: node.total_capacity,
            used_capacity: node.used_capacity,
            utilization_sum: node.utilization_sum,
            members: node.member_count,
        }
    }
}
