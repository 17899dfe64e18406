//! Per-tenant comparison table

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::CapacityAccumulator;
use crate::models::{AggregateNode, NodeKey, TableRow, Tenant};

#[derive(Default)]
struct TenantSpan {
    systems: BTreeSet<String>,
    pools: BTreeSet<String>,
    acc: CapacityAccumulator,
}

/// One row per tenant, collapsed across the systems it spans
///
/// Averages are recomputed over the tenant's full pool membership. UNKNOWN
/// tenants are scoped to a system and get one row per system. Only pool-level
/// nodes are read; other levels are ignored.
pub fn build_comparison_table(nodes: &[AggregateNode]) -> Vec<TableRow> {
    let mut spans: BTreeMap<(Tenant, Option<String>), TenantSpan> = BTreeMap::new();

    for node in nodes {
        let NodeKey::Pool {
            system,
            tenant,
            pool,
        } = &node.key
        else {
            continue;
        };

        let scope = tenant.is_unknown().then(|| system.clone());
        let span = spans.entry((tenant.clone(), scope)).or_default();
        span.systems.insert(system.clone());
        span.pools.insert(pool.clone());
        span.acc.merge(&CapacityAccumulator::from(node));
    }

    spans
        .into_iter()
        .map(|((tenant, _), span)| TableRow {
            tenant: tenant.name().to_string(),
            systems: span.systems.into_iter().collect(),
            pools: span.pools.into_iter().collect(),
            total_capacity: span.acc.total_capacity,
            used_capacity: span.acc.used_capacity,
            simple_avg_pct: span.acc.simple_avg_pct(),
            weighted_avg_pct: span.acc.weighted_avg_pct(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::models::{utilization_pct, PoolRecord, TenantMapping};
    use crate::resolver::resolve;
    use chrono::{NaiveDate, Utc};

    fn mapping(id: u64, tenant: &str, pool: &str) -> TenantMapping {
        TenantMapping {
            id,
            tenant_name: tenant.into(),
            pool_name: pool.into(),
            storage_system: None,
            created_at: Utc::now(),
        }
    }

    fn table(tenant_filter: Option<&str>) -> Vec<TableRow> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let pools = vec![
            PoolRecord::new("P1", "SysA", 1000.0, 800.0, date),
            PoolRecord::new("P2", "SysA", 500.0, 250.0, date),
            PoolRecord::new("P3", "SysB", 500.0, 0.0, date),
            PoolRecord::new("P4", "SysB", 100.0, 10.0, date),
            PoolRecord::new("lost-a", "SysA", 10.0, 5.0, date),
            PoolRecord::new("lost-b", "SysB", 10.0, 1.0, date),
        ];
        let mappings = vec![
            mapping(1, "Alpha", "P1"),
            mapping(2, "Alpha", "P2"),
            mapping(3, "Alpha", "P3"),
            mapping(4, "Beta", "P4"),
        ];
        let entries = resolve(&pools, &mappings).unwrap();
        let nodes = Aggregator::new()
            .with_tenant_filter(tenant_filter.map(str::to_string))
            .aggregate_all(&entries);
        build_comparison_table(&nodes)
    }

    #[test]
    fn test_tenant_collapses_across_systems() {
        let rows = table(None);
        let alpha = rows.iter().find(|r| r.tenant == "Alpha").unwrap();

        assert_eq!(alpha.systems, vec!["SysA", "SysB"]);
        assert_eq!(alpha.pools, vec!["P1", "P2", "P3"]);
        assert_eq!(alpha.total_capacity, 2000.0);
        assert_eq!(alpha.used_capacity, 1050.0);
        // (80 + 50 + 0) / 3 over every pool, not the mean of per-system averages
        assert!((alpha.simple_avg_pct - 130.0 / 3.0).abs() < 1e-9);
        assert_eq!(alpha.weighted_avg_pct, 52.5);
    }

    #[test]
    fn test_unknown_rows_stay_per_system() {
        let rows = table(None);
        let unknown: Vec<_> = rows.iter().filter(|r| r.tenant == "UNKNOWN").collect();

        assert_eq!(unknown.len(), 2);
        assert_eq!(unknown[0].systems, vec!["SysA"]);
        assert_eq!(unknown[1].systems, vec!["SysB"]);
        assert_eq!(unknown[0].weighted_avg_pct, 50.0);
    }

    #[test]
    fn test_rows_are_ordered_named_first() {
        let tenants: Vec<_> = table(None).into_iter().map(|r| r.tenant).collect();
        assert_eq!(tenants, vec!["Alpha", "Beta", "UNKNOWN", "UNKNOWN"]);
    }

    #[test]
    fn test_filtered_table_has_single_row() {
        let rows = table(Some("Beta"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pools, vec!["P4"]);
        assert_eq!(rows[0].weighted_avg_pct, 10.0);
    }

    #[test]
    fn test_simple_average_is_exact_over_combined_membership() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let specs = [
            ("g1", "SysA", 3.0, 1.0),
            ("g2", "SysA", 7.0, 2.0),
            ("g3", "SysA", 11.0, 3.0),
            ("g4", "SysA", 13.0, 5.0),
            ("g5", "SysB", 17.0, 7.0),
            ("g6", "SysB", 19.0, 11.0),
            ("g7", "SysB", 23.0, 13.0),
        ];
        let pools: Vec<_> = specs
            .iter()
            .map(|(name, system, total, used)| PoolRecord::new(*name, *system, *total, *used, date))
            .collect();
        let mappings: Vec<_> = specs
            .iter()
            .enumerate()
            .map(|(i, (name, ..))| mapping(i as u64 + 1, "Gamma", name))
            .collect();

        let entries = resolve(&pools, &mappings).unwrap();
        let rows = build_comparison_table(&Aggregator::new().aggregate_all(&entries));

        let expected = specs
            .iter()
            .map(|(_, _, total, used)| utilization_pct(*used, *total))
            .fold(0.0, |sum, pct| sum + pct)
            / specs.len() as f64;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].simple_avg_pct, expected);
    }

    #[test]
    fn test_empty_nodes_yield_empty_table() {
        assert!(build_comparison_table(&[]).is_empty());
    }
}
