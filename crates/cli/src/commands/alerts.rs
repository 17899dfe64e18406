//! Utilization alert commands

use anyhow::Result;
use capacity_lib::{ReportBuilder, ReportLogger, Snapshot};
use chrono::NaiveDate;
use colored::Colorize;
use tabled::Tabled;

use super::CommandContext;
use crate::output::{
    color_level, color_utilization, print_json, print_success, print_table, OutputFormat,
};

/// Row for the alerts table
#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "System")]
    system: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Utilization")]
    utilization: String,
    #[tabled(rename = "Days Until Full")]
    days_until_full: String,
}

/// Show pools at or above the warning threshold
pub fn show_alerts(
    ctx: &CommandContext,
    snapshot: &Snapshot,
    report_date: Option<NaiveDate>,
) -> Result<()> {
    let thresholds = ctx.config.thresholds();
    let alerts = ReportBuilder::new()
        .with_logger(ReportLogger::new("capview"))
        .alerts(snapshot, report_date, &thresholds)?;

    match ctx.format {
        OutputFormat::Json => print_json(&alerts)?,
        OutputFormat::Table => {
            println!("{}", "Capacity Alerts".bold());
            println!("{}", "=".repeat(60));

            if alerts.is_empty() {
                print_success("No pools above the warning threshold");
                return Ok(());
            }

            let rows: Vec<AlertRow> = alerts
                .iter()
                .map(|alert| AlertRow {
                    level: color_level(alert.level),
                    system: alert.storage_system.clone(),
                    pool: alert.pool_name.clone(),
                    utilization: color_utilization(
                        alert.utilization_pct,
                        ctx.config.precision,
                        &thresholds,
                    ),
                    days_until_full: match alert.days_until_full {
                        0 => "now".red().to_string(),
                        days => days.to_string(),
                    },
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}
