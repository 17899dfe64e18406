//! Observability infrastructure for capacity reporting
//!
//! Provides:
//! - Prometheus metrics (report build latency, pools processed, data-quality findings, alerts)
//! - Structured logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for report build latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ReportMetricsInner> = OnceLock::new();

struct ReportMetricsInner {
    report_build_seconds: Histogram,
    reports_built: IntCounter,
    pools_processed: IntCounter,
    findings: IntCounterVec,
    alerts_raised: IntCounterVec,
}

impl ReportMetricsInner {
    fn new() -> Self {
        Self {
            report_build_seconds: register_histogram!(
                "capacity_report_build_seconds",
                "Time spent resolving, aggregating and assembling a capacity report",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register report_build_seconds"),

            reports_built: register_int_counter!(
                "capacity_reports_built_total",
                "Total number of capacity reports built"
            )
            .expect("Failed to register reports_built"),

            pools_processed: register_int_counter!(
                "capacity_pools_processed_total",
                "Total number of pool records resolved into reports"
            )
            .expect("Failed to register pools_processed"),

            findings: register_int_counter_vec!(
                "capacity_data_quality_findings_total",
                "Data-quality findings by kind",
                &["kind"]
            )
            .expect("Failed to register findings"),

            alerts_raised: register_int_counter_vec!(
                "capacity_alerts_raised_total",
                "Utilization alerts raised by level",
                &["level"]
            )
            .expect("Failed to register alerts_raised"),
        }
    }
}

/// Report metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct ReportMetrics {
    _private: (),
}

impl Default for ReportMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ReportMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ReportMetricsInner {
        GLOBAL_METRICS.get_or_init(ReportMetricsInner::new)
    }

    pub fn observe_build_latency(&self, duration_secs: f64) {
        self.inner().report_build_seconds.observe(duration_secs);
        self.inner().reports_built.inc();
    }

    pub fn add_pools_processed(&self, count: u64) {
        self.inner().pools_processed.inc_by(count);
    }

    pub fn inc_finding(&self, kind: &str) {
        self.inner().findings.with_label_values(&[kind]).inc();
    }

    pub fn inc_alert(&self, level: &str) {
        self.inner().alerts_raised.with_label_values(&[level]).inc();
    }

    pub fn reports_built(&self) -> u64 {
        self.inner().reports_built.get()
    }

    /// Current values of the default registry in text exposition format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Structured logger for report events
#[derive(Clone)]
pub struct ReportLogger {
    source: String,
}

impl ReportLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Log a completed report
    pub fn log_report_built(
        &self,
        report_date: &str,
        tenant_filter: Option<&str>,
        pools: usize,
        nodes: usize,
        findings: usize,
        duration_ms: f64,
    ) {
        info!(
            event = "report_built",
            source = %self.source,
            report_date = %report_date,
            tenant_filter = ?tenant_filter,
            pools = pools,
            nodes = nodes,
            findings = findings,
            duration_ms = duration_ms,
            "Capacity report built"
        );
    }

    /// Log a pool that fell back to the UNKNOWN tenant
    pub fn log_unmapped_pool(&self, pool: &str, system: &str) {
        debug!(
            event = "pool_unmapped",
            source = %self.source,
            pool = %pool,
            storage_system = %system,
            "Pool has no tenant mapping, assigned to UNKNOWN"
        );
    }

    /// Log a pool matched by more than one mapping
    pub fn log_ambiguous_mapping(&self, pool: &str, system: &str, tenant: &str, shadowed: usize) {
        warn!(
            event = "mapping_ambiguous",
            source = %self.source,
            pool = %pool,
            storage_system = %system,
            tenant = %tenant,
            shadowed = shadowed,
            "Pool matched several tenant mappings, tie-break applied"
        );
    }

    /// Log a record whose figures fall outside the expected ranges
    pub fn log_capacity_anomaly(&self, pool: &str, system: &str, total: f64, used: f64) {
        warn!(
            event = "capacity_anomaly",
            source = %self.source,
            pool = %pool,
            storage_system = %system,
            total_capacity = total,
            used_capacity = used,
            "Pool capacity figures are inconsistent, reporting as-is"
        );
    }

    /// Log a trend computed over a date range
    pub fn log_trend_built(&self, from: Option<&str>, to: Option<&str>, points: usize) {
        info!(
            event = "trend_built",
            source = %self.source,
            from = ?from,
            to = ?to,
            points = points,
            "Capacity trend built"
        );
    }

    /// Log an import batch
    pub fn log_mapping_import(&self, added: usize, skipped: usize, errors: usize) {
        if errors == 0 {
            info!(
                event = "mapping_import",
                source = %self.source,
                added = added,
                skipped = skipped,
                "Tenant mappings imported"
            );
        } else {
            warn!(
                event = "mapping_import",
                source = %self.source,
                added = added,
                skipped = skipped,
                errors = errors,
                "Tenant mappings imported with rejected rows"
            );
        }
    }
}
