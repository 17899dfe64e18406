//! Tenant mapping commands

use anyhow::{Context, Result};
use capacity_lib::mapping_import::{import_mappings, tenant_names, MappingRow};
use capacity_lib::{ReportLogger, TenantMapping};
use chrono::Utc;
use colored::Colorize;
use std::path::Path;

use super::CommandContext;
use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};

/// List tenants referenced by the mappings
pub fn list_tenants(ctx: &CommandContext, mappings: &[TenantMapping]) -> Result<()> {
    let tenants = tenant_names(mappings);

    match ctx.format {
        OutputFormat::Json => print_json(&tenants)?,
        OutputFormat::Table => {
            if tenants.is_empty() {
                print_info("No tenant mappings loaded");
                return Ok(());
            }
            println!("{}", "Tenants".bold());
            println!("{}", "-".repeat(30));
            for tenant in &tenants {
                let pools = mappings.iter().filter(|m| &m.tenant_name == tenant).count();
                println!("{:<24} {} pool mapping(s)", tenant, pools);
            }
        }
    }

    Ok(())
}

/// Validate import rows and write the merged mapping set
///
/// Known tenants are the `--tenant` values plus tenants already present in
/// the existing mappings.
pub fn import(
    ctx: &CommandContext,
    rows: &[MappingRow],
    extra_tenants: &[String],
    existing: Vec<TenantMapping>,
    output: Option<&Path>,
) -> Result<()> {
    let mut known = tenant_names(&existing);
    known.extend(extra_tenants.iter().cloned());

    let outcome = import_mappings(rows, known.as_slice(), &existing, Utc::now());
    ReportLogger::new("capview").log_mapping_import(
        outcome.added.len(),
        outcome.skipped,
        outcome.errors.len(),
    );

    let added = outcome.added.len();
    let mut merged = existing;
    merged.extend(outcome.added);

    match output {
        Some(path) => {
            let content = serde_json::to_string_pretty(&merged)?;
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            if matches!(ctx.format, OutputFormat::Json) {
                print_json(&merged)?;
            }
        }
    }

    if matches!(ctx.format, OutputFormat::Table) {
        print_success(&format!(
            "{} mappings added, {} skipped",
            added, outcome.skipped
        ));
        for error in &outcome.errors {
            print_warning(&error.to_string());
        }
        if let Some(path) = output {
            print_info(&format!("Wrote {} mappings to {}", merged.len(), path.display()));
        }
    }

    Ok(())
}
