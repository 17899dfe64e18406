//! Output formatting utilities

use capacity_lib::alerts::{AlertLevel, AlertThresholds};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table of rows, or an empty-state notice
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serialisable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a GiB figure as GiB, TiB or PiB
pub fn format_capacity(gib: f64) -> String {
    const TIB: f64 = 1024.0;
    const PIB: f64 = TIB * 1024.0;

    let magnitude = gib.abs();
    if magnitude >= PIB {
        format!("{:.2} PiB", gib / PIB)
    } else if magnitude >= TIB {
        format!("{:.2} TiB", gib / TIB)
    } else {
        format!("{:.2} GiB", gib)
    }
}

/// Format a percentage with the configured number of decimals
pub fn format_pct(pct: f64, precision: usize) -> String {
    format!("{:.*}%", precision, pct)
}

/// Color a utilization percentage by alert level
pub fn color_utilization(pct: f64, precision: usize, thresholds: &AlertThresholds) -> String {
    let formatted = format_pct(pct, precision);
    match thresholds.classify(pct) {
        Some(AlertLevel::Emergency) | Some(AlertLevel::Critical) => {
            formatted.red().bold().to_string()
        }
        Some(AlertLevel::Warning) => formatted.yellow().to_string(),
        None => formatted.green().to_string(),
    }
}

/// Color an alert level name
pub fn color_level(level: AlertLevel) -> String {
    let name = level.to_string();
    match level {
        AlertLevel::Emergency => name.red().bold().to_string(),
        AlertLevel::Critical => name.red().to_string(),
        AlertLevel::Warning => name.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_capacity_units() {
        assert_eq!(format_capacity(512.0), "512.00 GiB");
        assert_eq!(format_capacity(2048.0), "2.00 TiB");
        assert_eq!(format_capacity(3.0 * 1024.0 * 1024.0), "3.00 PiB");
        assert_eq!(format_capacity(-1536.0), "-1.50 TiB");
    }

    #[test]
    fn test_format_pct_precision() {
        assert_eq!(format_pct(70.0, 1), "70.0%");
        assert_eq!(format_pct(66.666, 2), "66.67%");
        assert_eq!(format_pct(12.4, 0), "12%");
    }
}
