//! Bulk tenant mapping import
//!
//! Validates already-parsed `tenant,pool,storage_system` rows against the
//! known tenants and the current mapping set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::error::MappingImportError;
use crate::models::TenantMapping;

/// One bulk-import row; `storage_system` is optional
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MappingRow {
    #[serde(default)]
    pub tenant: String,
    #[serde(default)]
    pub pool: String,
    #[serde(default)]
    pub storage_system: Option<String>,
}

/// Result of an import batch
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub added: Vec<TenantMapping>,
    /// Rows whose (pool, storage system) is already mapped
    pub skipped: usize,
    pub errors: Vec<MappingImportError>,
}

impl ImportOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate rows and turn the acceptable ones into new mappings
///
/// Rows are numbered as in the source file, with the header on row 1.
/// Accepted mappings get ids following the highest existing id.
pub fn import_mappings<S: AsRef<str>>(
    rows: &[MappingRow],
    known_tenants: &[S],
    existing: &[TenantMapping],
    created_at: DateTime<Utc>,
) -> ImportOutcome {
    let tenants: HashSet<&str> = known_tenants.iter().map(|t| t.as_ref()).collect();
    let mut taken: HashSet<(String, Option<String>)> = existing
        .iter()
        .map(|m| (m.pool_name.clone(), m.storage_system.clone()))
        .collect();
    let mut next_id = existing.iter().map(|m| m.id).max().map_or(1, |id| id + 1);

    let mut outcome = ImportOutcome::default();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;
        let tenant = row.tenant.trim();
        let pool = row.pool.trim();
        let storage_system = row
            .storage_system
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if tenant.is_empty() || pool.is_empty() {
            outcome
                .errors
                .push(MappingImportError::MissingField { row: row_number });
            continue;
        }

        if !tenants.contains(tenant) {
            outcome.errors.push(MappingImportError::UnknownTenant {
                row: row_number,
                tenant: tenant.to_string(),
            });
            continue;
        }

        if !taken.insert((pool.to_string(), storage_system.clone())) {
            outcome.skipped += 1;
            continue;
        }

        outcome.added.push(TenantMapping {
            id: next_id,
            tenant_name: tenant.to_string(),
            pool_name: pool.to_string(),
            storage_system,
            created_at,
        });
        next_id += 1;
    }

    outcome
}

/// Sorted distinct tenant names referenced by the mappings
pub fn tenant_names(mappings: &[TenantMapping]) -> Vec<String> {
    mappings
        .iter()
        .map(|m| m.tenant_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
