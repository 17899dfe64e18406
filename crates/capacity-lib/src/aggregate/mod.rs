//! Capacity aggregation across the System → Tenant → Pool hierarchy
//!
//! Every group carries two utilization figures:
//! - simple average: mean of the member pools' own utilization percentages
//! - weighted average: group used capacity over group total capacity
//!
//! Groups roll up strictly: pools into (system, tenant) groups, tenant groups
//! into systems, systems into a single root.

mod accumulator;


pub use accumulator::CapacityAccumulator;

use std::collections::BTreeMap;

use crate::models::{AggregateNode, Level, NodeKey, ResolvedEntry, Tenant, DEFAULT_ROOT_LABEL};

/// Aggregation settings for one request
#[derive(Debug, Clone)]
pub struct Aggregator {
    root_label: String,
    tenant_filter: Option<String>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            tenant_filter: None,
        }
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label of the root node
    pub fn with_root_label(mut self, root_label: impl Into<String>) -> Self {
        self.root_label = root_label.into();
        self
    }

    /// Restrict aggregation to pools of a single tenant
    ///
    /// Matching is by tenant display name, so `"UNKNOWN"` selects the
    /// unmapped pools of every system.
    pub fn with_tenant_filter(mut self, tenant: Option<String>) -> Self {
        self.tenant_filter = tenant;
        self
    }

    pub fn root_label(&self) -> &str {
        &self.root_label
    }

    pub fn tenant_filter(&self) -> Option<&str> {
        self.tenant_filter.as_deref()
    }

    /// Nodes of a single hierarchy level
    pub fn aggregate(&self, entries: &[ResolvedEntry], level: Level) -> Vec<AggregateNode> {
        let rollup = self.rollup(entries);
        match level {
            Level::Root => vec![self.root_node(&rollup.root)],
            Level::System => self.system_nodes(&rollup),
            Level::Tenant => self.tenant_nodes(&rollup),
            Level::Pool => self.pool_nodes(&rollup),
        }
    }

    /// Nodes of every level, root first, then systems, tenants and pools
    pub fn aggregate_all(&self, entries: &[ResolvedEntry]) -> Vec<AggregateNode> {
        let rollup = self.rollup(entries);
        let mut nodes = Vec::with_capacity(
            1 + rollup.systems.len() + rollup.tenants.len() + rollup.pools.len(),
        );
        nodes.push(self.root_node(&rollup.root));
        nodes.extend(self.system_nodes(&rollup));
        nodes.extend(self.tenant_nodes(&rollup));
        nodes.extend(self.pool_nodes(&rollup));
        nodes
    }

    /// Whether the entry passes the tenant filter
    pub fn includes(&self, entry: &ResolvedEntry) -> bool {
        self.tenant_filter
            .as_deref()
            .map_or(true, |tenant| entry.tenant.name() == tenant)
    }

    fn rollup(&self, entries: &[ResolvedEntry]) -> Rollup {
        let mut rollup = Rollup::default();

        for entry in entries.iter().filter(|e| self.includes(e)) {
            rollup
                .pools
                .entry((entry.system.clone(), entry.tenant.clone(), entry.pool.clone()))
                .or_default()
                .add_member(entry.total_capacity, entry.used_capacity);
        }

        for ((system, tenant, _), acc) in &rollup.pools {
            rollup
                .tenants
                .entry((system.clone(), tenant.clone()))
                .or_default()
                .merge(acc);
        }

        for ((system, _), acc) in &rollup.tenants {
            rollup.systems.entry(system.clone()).or_default().merge(acc);
        }

        for acc in rollup.systems.values() {
            rollup.root.merge(acc);
        }

        rollup
    }

    fn root_node(&self, acc: &CapacityAccumulator) -> AggregateNode {
        self.node(NodeKey::Root, acc)
    }

    fn system_nodes(&self, rollup: &Rollup) -> Vec<AggregateNode> {
        rollup
            .systems
            .iter()
            .map(|(system, acc)| {
                let key = NodeKey::System {
                    system: system.clone(),
                };
                self.node(key, acc)
            })
            .collect()
    }

    fn tenant_nodes(&self, rollup: &Rollup) -> Vec<AggregateNode> {
        rollup
            .tenants
            .iter()
            .map(|((system, tenant), acc)| {
                let key = NodeKey::Tenant {
                    system: system.clone(),
                    tenant: tenant.clone(),
                };
                self.node(key, acc)
            })
            .collect()
    }

    fn pool_nodes(&self, rollup: &Rollup) -> Vec<AggregateNode> {
        rollup
            .pools
            .iter()
            .map(|((system, tenant, pool), acc)| {
                let key = NodeKey::Pool {
                    system: system.clone(),
                    tenant: tenant.clone(),
                    pool: pool.clone(),
                };
                self.node(key, acc)
            })
            .collect()
    }

    fn node(&self, key: NodeKey, acc: &CapacityAccumulator) -> AggregateNode {
        let parent_label = key
            .parent()
            .map(|parent| parent.label(&self.root_label))
            .unwrap_or_default();

        AggregateNode {
            label: key.label(&self.root_label),
            name: key.display_name(&self.root_label).to_string(),
            parent_label,
            key,
            total_capacity: acc.total_capacity,
            used_capacity: acc.used_capacity,
            available_capacity: acc.available_capacity(),
            member_count: acc.members,
            utilization_sum: acc.utilization_sum(),
            simple_avg_utilization_pct: acc.simple_avg_pct(),
            weighted_avg_utilization_pct: acc.weighted_avg_pct(),
        }
    }
}

#[derive(Default)]
struct Rollup {
    pools: BTreeMap<(String, Tenant, String), CapacityAccumulator>,
    tenants: BTreeMap<(String, Tenant), CapacityAccumulator>,
    systems: BTreeMap<String, CapacityAccumulator>,
    root: CapacityAccumulator,
}
