//! Request-scoped capacity reports
//!
//! Selects the pools of one report date, runs resolve → aggregate → build,
//! and collects data-quality findings for the caller to surface. This is the
//! only layer that logs and records metrics; the stages below it are pure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::aggregate::{Aggregator, CapacityAccumulator};
use crate::alerts::{generate_alerts, AlertThresholds, CapacityAlert};
use crate::error::{CapacityError, Result};
use crate::hierarchy::{build_comparison_table, build_tree};
use crate::models::{
    AggregateNode, MatchKind, PoolRecord, ResolvedEntry, TableRow, TenantMapping, TreeNode,
    UtilizationView, DEFAULT_ROOT_LABEL,
};
use crate::observability::{ReportLogger, ReportMetrics};
use crate::resolver::{resolve, validate};

/// Inventory pool records across report dates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub pools: Vec<PoolRecord>,
}

impl Snapshot {
    pub fn new(pools: Vec<PoolRecord>) -> Self {
        Self { pools }
    }

    /// Distinct report dates, oldest first
    pub fn report_dates(&self) -> Vec<NaiveDate> {
        self.pools
            .iter()
            .map(|p| p.report_date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn latest_report_date(&self) -> Option<NaiveDate> {
        self.pools.iter().map(|p| p.report_date).max()
    }

    /// Pools belonging to one report date
    pub fn pools_on(&self, date: NaiveDate) -> Vec<PoolRecord> {
        self.pools
            .iter()
            .filter(|p| p.report_date == date)
            .cloned()
            .collect()
    }

    /// Fleet-wide totals per report date, oldest first
    ///
    /// Both bounds are inclusive; an open bound extends to the first or last
    /// date in the snapshot. Dates without records produce no point.
    pub fn trend(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Vec<TrendPoint>> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(CapacityError::InvalidDateRange { from, to });
            }
        }

        let mut by_date: BTreeMap<NaiveDate, CapacityAccumulator> = BTreeMap::new();
        for pool in &self.pools {
            let date = pool.report_date;
            if from.is_some_and(|from| date < from) || to.is_some_and(|to| date > to) {
                continue;
            }
            validate(pool)?;
            by_date
                .entry(date)
                .or_default()
                .add_member(pool.total_capacity, pool.used_capacity);
        }

        Ok(by_date
            .into_iter()
            .map(|(report_date, acc)| TrendPoint {
                report_date,
                pool_count: acc.members,
                total_capacity: acc.total_capacity,
                used_capacity: acc.used_capacity,
                available_capacity: acc.available_capacity(),
                utilization_pct: acc.weighted_avg_pct(),
            })
            .collect())
    }

    /// The requested date, or the latest one when none is given
    pub fn resolve_date(&self, requested: Option<NaiveDate>) -> Result<NaiveDate> {
        requested
            .or_else(|| self.latest_report_date())
            .ok_or(CapacityError::EmptySnapshot)
    }
}

/// Capacity of the whole inventory on one report date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub report_date: NaiveDate,
    pub pool_count: usize,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub available_capacity: f64,
    /// Used over total across all pools of the date
    pub utilization_pct: f64,
}

/// Parameters of one report request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub report_date: Option<NaiveDate>,
    #[serde(default)]
    pub tenant_filter: Option<String>,
    #[serde(default)]
    pub view: UtilizationView,
}

/// Data-quality problem found while building a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// Pool without a tenant mapping, reported under UNKNOWN
    Unmapped { pool: String, system: String },
    /// Pool matched by several mappings
    AmbiguousMapping {
        pool: String,
        system: String,
        tenant: String,
        shadowed: usize,
    },
    /// Used capacity exceeds total capacity
    OverCommitted {
        pool: String,
        system: String,
        total_capacity: f64,
        used_capacity: f64,
    },
    NegativeUsed {
        pool: String,
        system: String,
        total_capacity: f64,
        used_capacity: f64,
    },
}

impl DataQualityIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            DataQualityIssue::Unmapped { .. } => "unmapped",
            DataQualityIssue::AmbiguousMapping { .. } => "ambiguous_mapping",
            DataQualityIssue::OverCommitted { .. } => "over_committed",
            DataQualityIssue::NegativeUsed { .. } => "negative_used",
        }
    }

    pub fn pool(&self) -> &str {
        match self {
            DataQualityIssue::Unmapped { pool, .. }
            | DataQualityIssue::AmbiguousMapping { pool, .. }
            | DataQualityIssue::OverCommitted { pool, .. }
            | DataQualityIssue::NegativeUsed { pool, .. } => pool,
        }
    }

    pub fn system(&self) -> &str {
        match self {
            DataQualityIssue::Unmapped { system, .. }
            | DataQualityIssue::AmbiguousMapping { system, .. }
            | DataQualityIssue::OverCommitted { system, .. }
            | DataQualityIssue::NegativeUsed { system, .. } => system,
        }
    }
}

/// Findings for one resolved entry
pub fn inspect_entry(entry: &ResolvedEntry) -> Vec<DataQualityIssue> {
    let mut issues = Vec::new();

    match entry.match_kind {
        MatchKind::Unmapped => issues.push(DataQualityIssue::Unmapped {
            pool: entry.pool.clone(),
            system: entry.system.clone(),
        }),
        _ if entry.shadowed > 0 => issues.push(DataQualityIssue::AmbiguousMapping {
            pool: entry.pool.clone(),
            system: entry.system.clone(),
            tenant: entry.tenant.name().to_string(),
            shadowed: entry.shadowed,
        }),
        _ => {}
    }

    if entry.used_capacity < 0.0 {
        issues.push(DataQualityIssue::NegativeUsed {
            pool: entry.pool.clone(),
            system: entry.system.clone(),
            total_capacity: entry.total_capacity,
            used_capacity: entry.used_capacity,
        });
    } else if entry.used_capacity > entry.total_capacity {
        issues.push(DataQualityIssue::OverCommitted {
            pool: entry.pool.clone(),
            system: entry.system.clone(),
            total_capacity: entry.total_capacity,
            used_capacity: entry.used_capacity,
        });
    }

    issues
}

/// Everything a dashboard needs for one report date
#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    pub report_date: NaiveDate,
    pub tenant_filter: Option<String>,
    pub view: UtilizationView,
    pub nodes: Vec<AggregateNode>,
    pub tree: Vec<TreeNode>,
    pub table: Vec<TableRow>,
    pub findings: Vec<DataQualityIssue>,
}

impl CapacityReport {
    /// The root aggregate
    pub fn root(&self) -> Option<&AggregateNode> {
        self.nodes.first()
    }
}

/// Builds reports and records their observability signals
#[derive(Clone)]
pub struct ReportBuilder {
    root_label: String,
    metrics: ReportMetrics,
    logger: ReportLogger,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            metrics: ReportMetrics::new(),
            logger: ReportLogger::new("capacity-report"),
        }
    }

    pub fn with_root_label(mut self, root_label: impl Into<String>) -> Self {
        self.root_label = root_label.into();
        self
    }

    pub fn with_logger(mut self, logger: ReportLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(
        &self,
        snapshot: &Snapshot,
        mappings: &[TenantMapping],
        request: &ReportRequest,
    ) -> Result<CapacityReport> {
        let started = Instant::now();
        let report_date = snapshot.resolve_date(request.report_date)?;
        let pools = snapshot.pools_on(report_date);

        let entries = resolve(&pools, mappings)?;
        let aggregator = Aggregator::new()
            .with_root_label(self.root_label.clone())
            .with_tenant_filter(request.tenant_filter.clone());

        let findings: Vec<DataQualityIssue> = entries
            .iter()
            .filter(|e| aggregator.includes(e))
            .flat_map(inspect_entry)
            .collect();

        let nodes = aggregator.aggregate_all(&entries);
        let tree = build_tree(&nodes, request.view)?;
        let table = build_comparison_table(&nodes);

        self.record(&findings);
        let elapsed = started.elapsed();
        self.metrics.observe_build_latency(elapsed.as_secs_f64());
        self.metrics.add_pools_processed(pools.len() as u64);
        self.logger.log_report_built(
            &report_date.to_string(),
            request.tenant_filter.as_deref(),
            pools.len(),
            nodes.len(),
            findings.len(),
            elapsed.as_secs_f64() * 1000.0,
        );

        Ok(CapacityReport {
            report_date,
            tenant_filter: request.tenant_filter.clone(),
            view: request.view,
            nodes,
            tree,
            table,
            findings,
        })
    }

    /// Capacity trend over a date range
    pub fn trend(
        &self,
        snapshot: &Snapshot,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TrendPoint>> {
        let points = snapshot.trend(from, to)?;
        self.logger.log_trend_built(
            from.map(|d| d.to_string()).as_deref(),
            to.map(|d| d.to_string()).as_deref(),
            points.len(),
        );
        Ok(points)
    }

    /// Utilization alerts for the pools of one report date
    pub fn alerts(
        &self,
        snapshot: &Snapshot,
        report_date: Option<NaiveDate>,
        thresholds: &AlertThresholds,
    ) -> Result<Vec<CapacityAlert>> {
        let date = snapshot.resolve_date(report_date)?;
        let alerts = generate_alerts(&snapshot.pools_on(date), thresholds);
        for alert in &alerts {
            self.metrics.inc_alert(&alert.level.to_string());
        }
        Ok(alerts)
    }

    fn record(&self, findings: &[DataQualityIssue]) {
        for finding in findings {
            self.metrics.inc_finding(finding.kind());
            match finding {
                DataQualityIssue::Unmapped { pool, system } => {
                    self.logger.log_unmapped_pool(pool, system)
                }
                DataQualityIssue::AmbiguousMapping {
                    pool,
                    system,
                    tenant,
                    shadowed,
                } => self
                    .logger
                    .log_ambiguous_mapping(pool, system, tenant, *shadowed),
                DataQualityIssue::OverCommitted {
                    pool,
                    system,
                    total_capacity,
                    used_capacity,
                }
                | DataQualityIssue::NegativeUsed {
                    pool,
                    system,
                    total_capacity,
                    used_capacity,
                } => self
                    .logger
                    .log_capacity_anomaly(pool, system, *total_capacity, *used_capacity),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, Tenant};
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn mapping(id: u64, tenant: &str, pool: &str, system: Option<&str>) -> TenantMapping {
        TenantMapping {
            id,
            tenant_name: tenant.into(),
            pool_name: pool.into(),
            storage_system: system.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap(),
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![
            PoolRecord::new("P1", "SysA", 1000.0, 800.0, day(1)),
            PoolRecord::new("P1", "SysA", 1000.0, 900.0, day(2)),
            PoolRecord::new("P2", "SysA", 500.0, 250.0, day(2)),
            PoolRecord::new("P3", "SysB", 100.0, 120.0, day(2)),
            PoolRecord::new("P4", "SysB", 400.0, 100.0, day(2)),
        ])
    }

    fn mappings() -> Vec<TenantMapping> {
        vec![
            mapping(1, "Alpha", "P1", None),
            mapping(2, "Alpha", "P2", Some("SysA")),
            mapping(3, "Beta", "P2", None),
            mapping(4, "Beta", "P4", None),
        ]
    }

    #[test]
    fn test_snapshot_dates() {
        let snap = snapshot();
        assert_eq!(snap.report_dates(), vec![day(1), day(2)]);
        assert_eq!(snap.latest_report_date(), Some(day(2)));
        assert_eq!(snap.pools_on(day(1)).len(), 1);
        assert_eq!(Snapshot::default().resolve_date(None), Err(CapacityError::EmptySnapshot));
    }

    #[test]
    fn test_report_defaults_to_latest_date() {
        let report = ReportBuilder::new()
            .build(&snapshot(), &mappings(), &ReportRequest::default())
            .unwrap();

        assert_eq!(report.report_date, day(2));
        let root = report.root().unwrap();
        assert_eq!(root.level(), Level::Root);
        assert_eq!(root.total_capacity, 2000.0);
        assert_eq!(root.used_capacity, 1370.0);
        assert_eq!(report.tree.len(), report.nodes.len());
    }

    #[test]
    fn test_report_for_older_date() {
        let request = ReportRequest {
            report_date: Some(day(1)),
            ..Default::default()
        };
        let report = ReportBuilder::new()
            .build(&snapshot(), &mappings(), &request)
            .unwrap();
        assert_eq!(report.root().unwrap().used_capacity, 800.0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_report_for_date_without_records_is_empty_root() {
        let request = ReportRequest {
            report_date: Some(day(9)),
            ..Default::default()
        };
        let report = ReportBuilder::new()
            .build(&snapshot(), &mappings(), &request)
            .unwrap();
        assert_eq!(report.nodes.len(), 1);
        assert_eq!(report.root().unwrap().total_capacity, 0.0);
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_findings_cover_unmapped_ambiguous_and_overcommitted() {
        let report = ReportBuilder::new()
            .build(&snapshot(), &mappings(), &ReportRequest::default())
            .unwrap();

        let kinds: Vec<_> = report.findings.iter().map(|f| (f.kind(), f.pool())).collect();
        assert!(kinds.contains(&("ambiguous_mapping", "P2")));
        assert!(kinds.contains(&("unmapped", "P3")));
        assert!(kinds.contains(&("over_committed", "P3")));
        assert_eq!(report.findings.len(), 3);

        // The qualified mapping wins for P2
        let alpha = report.table.iter().find(|r| r.tenant == "Alpha").unwrap();
        assert_eq!(alpha.pools, vec!["P1", "P2"]);
    }

    #[test]
    fn test_tenant_filter_scopes_report_and_findings() {
        let request = ReportRequest {
            tenant_filter: Some("Beta".into()),
            ..Default::default()
        };
        let report = ReportBuilder::new()
            .build(&snapshot(), &mappings(), &request)
            .unwrap();

        assert_eq!(report.root().unwrap().total_capacity, 400.0);
        assert!(report.findings.is_empty());
        assert!(report
            .nodes
            .iter()
            .all(|n| !matches!(&n.key, crate::models::NodeKey::Tenant { tenant, .. } if *tenant != Tenant::Named("Beta".into()))));
    }

    #[test]
    fn test_invalid_record_fails_report() {
        let snap = Snapshot::new(vec![PoolRecord::new("bad", "SysA", -5.0, 0.0, day(1))]);
        let err = ReportBuilder::new()
            .build(&snap, &[], &ReportRequest::default())
            .unwrap_err();
        assert!(matches!(err, CapacityError::InvalidRecord { .. }));
    }

    #[test]
    fn test_simple_view_tree() {
        let request = ReportRequest {
            view: UtilizationView::Simple,
            ..Default::default()
        };
        let report = ReportBuilder::new()
            .with_root_label("Fleet")
            .build(&snapshot(), &mappings(), &request)
            .unwrap();
        assert_eq!(report.tree[0].label, "Fleet");
        assert_eq!(report.view, UtilizationView::Simple);
    }

    #[test]
    fn test_alerts_for_latest_date() {
        let alerts = ReportBuilder::new()
            .alerts(&snapshot(), None, &AlertThresholds::default())
            .unwrap();
        let names: Vec<_> = alerts.iter().map(|a| a.pool_name.as_str()).collect();
        assert_eq!(names, vec!["P3", "P1"]);
    }

    #[test]
    fn test_inspect_negative_used() {
        let entry = ResolvedEntry {
            pool: "P".into(),
            system: "S".into(),
            tenant: Tenant::Named("T".into()),
            total_capacity: 10.0,
            used_capacity: -1.0,
            match_kind: MatchKind::Wildcard,
            shadowed: 0,
        };
        assert_eq!(
            inspect_entry(&entry),
            vec![DataQualityIssue::NegativeUsed {
                pool: "P".into(),
                system: "S".into(),
                total_capacity: 10.0,
                used_capacity: -1.0
            }]
        );
    }

    #[test]
    fn test_report_serializes_findings_with_kind_tag() {
        let report = ReportBuilder::new()
            .build(&snapshot(), &mappings(), &ReportRequest::default())
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["report_date"], "2024-03-02");
        assert!(json["findings"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f["kind"] == "unmapped"));
    }

    #[test]
    fn test_trend_rolls_up_each_date() {
        let points = snapshot().trend(None, None).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].report_date, day(1));
        assert_eq!(points[0].pool_count, 1);
        assert_eq!(points[0].utilization_pct, 80.0);

        let latest = &points[1];
        assert_eq!(latest.pool_count, 4);
        assert_eq!(latest.total_capacity, 2000.0);
        assert_eq!(latest.used_capacity, 1370.0);
        assert_eq!(latest.available_capacity, 630.0);
        assert_eq!(latest.utilization_pct, 68.5);
    }

    #[test]
    fn test_trend_bounds_are_inclusive() {
        let snap = snapshot();
        let only_first = snap.trend(Some(day(1)), Some(day(1))).unwrap();
        assert_eq!(only_first.len(), 1);
        assert_eq!(only_first[0].report_date, day(1));

        let from_second = snap.trend(Some(day(2)), None).unwrap();
        assert_eq!(from_second.len(), 1);
        assert_eq!(from_second[0].report_date, day(2));

        assert!(snap.trend(Some(day(5)), Some(day(9))).unwrap().is_empty());
    }

    #[test]
    fn test_trend_rejects_reversed_range() {
        let err = ReportBuilder::new()
            .trend(&snapshot(), Some(day(2)), Some(day(1)))
            .unwrap_err();
        assert_eq!(
            err,
            CapacityError::InvalidDateRange {
                from: day(2),
                to: day(1)
            }
        );
    }

    #[test]
    fn test_report_accepts_system_named_like_root() {
        let snap = Snapshot::new(vec![
            PoolRecord::new("P1", "All Storage", 100.0, 50.0, day(1)),
            PoolRecord::new("P1", "A", 100.0, 10.0, day(1)),
            PoolRecord::new("P2", "A/B", 100.0, 90.0, day(1)),
        ]);
        let mappings = vec![mapping(1, "B", "P1", Some("A"))];

        let report = ReportBuilder::new()
            .build(&snap, &mappings, &ReportRequest::default())
            .unwrap();
        assert_eq!(report.root().unwrap().total_capacity, 300.0);
        assert_eq!(report.tree.iter().filter(|n| n.level == Level::System).count(), 3);
    }
}
