//! Storage capacity reporting CLI
//!
//! A command-line tool for aggregating pool inventory snapshots into
//! System → Tenant → Pool capacity reports, tenant comparisons and alerts.

mod commands;
mod config;
mod loader;
mod output;

use anyhow::{Context, Result};
use capacity_lib::{ReportMetrics, ReportRequest, UtilizationView};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use commands::{alerts, mappings, report, CommandContext};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Storage capacity reporting CLI
#[derive(Parser)]
#[command(name = "capview")]
#[command(author, version, about = "Storage Capacity Reporting CLI", long_about = None)]
pub struct Cli {
    /// Pool inventory JSON document (can also be set via CAPVIEW_POOLS env var)
    #[arg(long, env = "CAPVIEW_POOLS", global = true)]
    pub pools: Option<PathBuf>,

    /// Tenant mapping JSON document (can also be set via CAPVIEW_MAPPINGS env var)
    #[arg(long, env = "CAPVIEW_MAPPINGS", global = true)]
    pub mappings: Option<PathBuf>,

    /// Configuration file (defaults to ~/.config/capview/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Report date and tenant selection
#[derive(Args)]
pub struct ScopeArgs {
    /// Report date (YYYY-MM-DD, defaults to the latest date)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Restrict to a single tenant
    #[arg(long, short)]
    pub tenant: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the System → Tenant → Pool capacity tree
    Tree {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Utilization view (weighted, simple)
        #[arg(long)]
        view: Option<UtilizationView>,
    },

    /// Show the per-tenant comparison table
    Table {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Show data-quality findings
    Findings {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Show pools above utilization thresholds
    Alerts {
        /// Report date (YYYY-MM-DD, defaults to the latest date)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show total capacity and utilization per report date
    Trend {
        /// First report date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last report date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// List report dates in the snapshot
    Dates,

    /// List tenants referenced by the mappings
    Tenants,

    /// Tenant mapping management
    #[command(subcommand)]
    Mappings(MappingsCommands),
}

#[derive(Subcommand)]
pub enum MappingsCommands {
    /// Validate and merge bulk mapping rows
    Import {
        /// JSON array of {tenant, pool, storage_system} rows
        rows: PathBuf,

        /// Tenant allowed in addition to those already mapped (repeatable)
        #[arg(long = "tenant")]
        tenants: Vec<String>,

        /// Write the merged mapping set to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn require_pools(path: Option<&Path>) -> Result<&Path> {
    path.context("A pool inventory document is required (--pools or CAPVIEW_POOLS)")
}

fn request(scope: ScopeArgs, view: UtilizationView) -> ReportRequest {
    ReportRequest {
        report_date: scope.date,
        tenant_filter: scope.tenant,
        view,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let ctx = CommandContext {
        config: config::ReportConfig::load(cli.config.as_deref())?,
        format: cli.format,
    };
    let pools_path = cli.pools.as_deref();
    let mappings_path = cli.mappings.as_deref();

    match cli.command {
        Commands::Tree { scope, view } => {
            let snapshot = loader::load_snapshot(require_pools(pools_path)?)?;
            let mappings = loader::load_mappings(mappings_path)?;
            let view = report::effective_view(&ctx, view);
            report::show_tree(&ctx, &snapshot, &mappings, &request(scope, view))?;
        }
        Commands::Table { scope } => {
            let snapshot = loader::load_snapshot(require_pools(pools_path)?)?;
            let mappings = loader::load_mappings(mappings_path)?;
            let view = ctx.config.default_view;
            report::show_table(&ctx, &snapshot, &mappings, &request(scope, view))?;
        }
        Commands::Findings { scope } => {
            let snapshot = loader::load_snapshot(require_pools(pools_path)?)?;
            let mappings = loader::load_mappings(mappings_path)?;
            let view = ctx.config.default_view;
            report::show_findings(&ctx, &snapshot, &mappings, &request(scope, view))?;
        }
        Commands::Alerts { date } => {
            let snapshot = loader::load_snapshot(require_pools(pools_path)?)?;
            alerts::show_alerts(&ctx, &snapshot, date)?;
        }
        Commands::Trend { from, to } => {
            let snapshot = loader::load_snapshot(require_pools(pools_path)?)?;
            report::show_trend(&ctx, &snapshot, from, to)?;
        }
        Commands::Dates => {
            let snapshot = loader::load_snapshot(require_pools(pools_path)?)?;
            report::show_dates(&ctx, &snapshot)?;
        }
        Commands::Tenants => {
            let mappings = loader::load_mappings(mappings_path)?;
            mappings::list_tenants(&ctx, &mappings)?;
        }
        Commands::Mappings(MappingsCommands::Import {
            rows,
            tenants,
            output,
        }) => {
            let rows = loader::load_rows(&rows)?;
            let existing = loader::load_mappings(mappings_path)?;
            mappings::import(&ctx, &rows, &tenants, existing, output.as_deref())?;
        }
    }

    if cli.metrics {
        eprintln!("{}", ReportMetrics::new().render()?);
    }

    Ok(())
}
