//! Capacity report commands

use anyhow::Result;
use capacity_lib::{
    CapacityReport, DataQualityIssue, Level, ReportBuilder, ReportLogger, ReportRequest,
    Snapshot, TenantMapping, UtilizationView,
};
use chrono::NaiveDate;
use colored::Colorize;
use tabled::Tabled;

use super::CommandContext;
use crate::output::{
    color_utilization, format_capacity, format_pct, print_info, print_json, print_table,
    print_warning, OutputFormat,
};

/// Row for the capacity tree table
#[derive(Tabled)]
struct TreeRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Utilization")]
    utilization: String,
}

/// Row for the tenant comparison table
#[derive(Tabled)]
struct TenantRow {
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Systems")]
    systems: String,
    #[tabled(rename = "Pools")]
    pools: usize,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Simple Avg")]
    simple_avg: String,
    #[tabled(rename = "Weighted Avg")]
    weighted_avg: String,
}

/// Row for the capacity trend table
#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Pools")]
    pools: usize,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Utilization")]
    utilization: String,
}

/// Row for the data-quality findings table
#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "System")]
    system: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn build_report(
    ctx: &CommandContext,
    snapshot: &Snapshot,
    mappings: &[TenantMapping],
    request: &ReportRequest,
) -> Result<CapacityReport> {
    let report = ReportBuilder::new()
        .with_root_label(ctx.config.root_label.clone())
        .with_logger(ReportLogger::new("capview"))
        .build(snapshot, mappings, request)?;
    Ok(report)
}

fn print_header(title: &str, report: &CapacityReport) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(60));
    println!("Report date:            {}", report.report_date.to_string().cyan());
    match &report.tenant_filter {
        Some(tenant) => println!("Tenant:                 {}", tenant.cyan()),
        None => println!("Scope:                  {}", "All tenants".cyan()),
    }
    println!();
}

fn hint_findings(report: &CapacityReport) {
    if !report.findings.is_empty() {
        println!();
        print_warning(&format!(
            "{} data-quality findings, see `capview findings`",
            report.findings.len()
        ));
    }
}

/// Show the System → Tenant → Pool tree
pub fn show_tree(
    ctx: &CommandContext,
    snapshot: &Snapshot,
    mappings: &[TenantMapping],
    request: &ReportRequest,
) -> Result<()> {
    let report = build_report(ctx, snapshot, mappings, request)?;

    match ctx.format {
        OutputFormat::Json => print_json(&report.tree)?,
        OutputFormat::Table => {
            let view = match report.view {
                UtilizationView::Weighted => "weighted average",
                UtilizationView::Simple => "simple average",
            };
            print_header(&format!("Capacity Tree ({view})"), &report);

            let thresholds = ctx.config.thresholds();
            let precision = ctx.config.precision;
            let rows: Vec<TreeRow> = report
                .tree
                .iter()
                .map(|node| {
                    let depth = match node.level {
                        Level::Root => 0,
                        Level::System => 1,
                        Level::Tenant => 2,
                        Level::Pool => 3,
                    };
                    TreeRow {
                        node: format!("{}{}", "  ".repeat(depth), node.name),
                        level: format!("{:?}", node.level).to_lowercase(),
                        total: format_capacity(node.total_capacity),
                        used: format_capacity(node.used_capacity),
                        available: format_capacity(node.available_capacity),
                        utilization: color_utilization(node.utilization_pct, precision, &thresholds),
                    }
                })
                .collect();
            print_table(&rows);
            hint_findings(&report);
        }
    }

    Ok(())
}

/// Show the per-tenant comparison table
pub fn show_table(
    ctx: &CommandContext,
    snapshot: &Snapshot,
    mappings: &[TenantMapping],
    request: &ReportRequest,
) -> Result<()> {
    let report = build_report(ctx, snapshot, mappings, request)?;

    match ctx.format {
        OutputFormat::Json => print_json(&report.table)?,
        OutputFormat::Table => {
            print_header("Tenant Comparison", &report);

            let precision = ctx.config.precision;
            let rows: Vec<TenantRow> = report
                .table
                .iter()
                .map(|row| TenantRow {
                    tenant: row.tenant.clone(),
                    systems: row.systems.join(", "),
                    pools: row.pools.len(),
                    total: format_capacity(row.total_capacity),
                    used: format_capacity(row.used_capacity),
                    simple_avg: format_pct(row.simple_avg_pct, precision),
                    weighted_avg: format_pct(row.weighted_avg_pct, precision),
                })
                .collect();
            print_table(&rows);
            hint_findings(&report);
        }
    }

    Ok(())
}

/// Show data-quality findings for a report
pub fn show_findings(
    ctx: &CommandContext,
    snapshot: &Snapshot,
    mappings: &[TenantMapping],
    request: &ReportRequest,
) -> Result<()> {
    let report = build_report(ctx, snapshot, mappings, request)?;

    match ctx.format {
        OutputFormat::Json => print_json(&report.findings)?,
        OutputFormat::Table => {
            print_header("Data-Quality Findings", &report);

            if report.findings.is_empty() {
                print_info("No data-quality findings");
                return Ok(());
            }

            let precision = ctx.config.precision;
            let rows: Vec<FindingRow> = report
                .findings
                .iter()
                .map(|finding| FindingRow {
                    kind: finding.kind().to_string(),
                    system: finding.system().to_string(),
                    pool: finding.pool().to_string(),
                    detail: describe(finding, precision),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

fn describe(finding: &DataQualityIssue, precision: usize) -> String {
    match finding {
        DataQualityIssue::Unmapped { .. } => "no tenant mapping, reported as UNKNOWN".to_string(),
        DataQualityIssue::AmbiguousMapping {
            tenant, shadowed, ..
        } => format!("assigned to {tenant}, {shadowed} other mapping(s) ignored"),
        DataQualityIssue::OverCommitted {
            total_capacity,
            used_capacity,
            ..
        } => format!(
            "used {} exceeds total {} ({})",
            format_capacity(*used_capacity),
            format_capacity(*total_capacity),
            format_pct(
                capacity_lib::utilization_pct(*used_capacity, *total_capacity),
                precision
            )
        ),
        DataQualityIssue::NegativeUsed { used_capacity, .. } => {
            format!("negative used capacity {}", format_capacity(*used_capacity))
        }
    }
}

/// Show fleet-wide capacity per report date
pub fn show_trend(
    ctx: &CommandContext,
    snapshot: &Snapshot,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let points = ReportBuilder::new()
        .with_logger(ReportLogger::new("capview"))
        .trend(snapshot, from, to)?;

    match ctx.format {
        OutputFormat::Json => print_json(&points)?,
        OutputFormat::Table => {
            println!("{}", "Capacity Trend".bold());
            println!("{}", "=".repeat(60));

            if points.is_empty() {
                print_info("No report dates in range");
                return Ok(());
            }

            let thresholds = ctx.config.thresholds();
            let rows: Vec<TrendRow> = points
                .iter()
                .map(|point| TrendRow {
                    date: point.report_date.to_string(),
                    pools: point.pool_count,
                    total: format_capacity(point.total_capacity),
                    used: format_capacity(point.used_capacity),
                    available: format_capacity(point.available_capacity),
                    utilization: color_utilization(
                        point.utilization_pct,
                        ctx.config.precision,
                        &thresholds,
                    ),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// List the report dates present in the snapshot
pub fn show_dates(ctx: &CommandContext, snapshot: &Snapshot) -> Result<()> {
    let dates: Vec<String> = snapshot
        .report_dates()
        .into_iter()
        .rev()
        .map(|d| d.to_string())
        .collect();

    match ctx.format {
        OutputFormat::Json => print_json(&dates)?,
        OutputFormat::Table => {
            if dates.is_empty() {
                print_warning("Snapshot contains no pool records");
            } else {
                println!("{}", "Report Dates".bold());
                println!("{}", "-".repeat(30));
                for (index, date) in dates.iter().enumerate() {
                    if index == 0 {
                        println!("{} {}", date, "(latest)".dimmed());
                    } else {
                        println!("{}", date);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Resolve the `--view` flag against the configured default
pub fn effective_view(ctx: &CommandContext, requested: Option<UtilizationView>) -> UtilizationView {
    requested.unwrap_or(ctx.config.default_view)
}
