//! Loading of inventory and mapping documents

use anyhow::{Context, Result};
use capacity_lib::mapping_import::MappingRow;
use capacity_lib::{PoolRecord, Snapshot, TenantMapping};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// Pool documents are either `{"pools": [...]}` or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Bare(Vec<PoolRecord>),
    Wrapped(Snapshot),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let document: SnapshotDocument = read_json(path)?;
    let snapshot = match document {
        SnapshotDocument::Bare(pools) => Snapshot::new(pools),
        SnapshotDocument::Wrapped(snapshot) => snapshot,
    };
    tracing::debug!(
        path = %path.display(),
        pools = snapshot.pools.len(),
        "Loaded pool snapshot"
    );
    Ok(snapshot)
}

/// Mappings are optional; without a file every pool resolves to UNKNOWN
pub fn load_mappings(path: Option<&Path>) -> Result<Vec<TenantMapping>> {
    match path {
        Some(path) => {
            let mappings: Vec<TenantMapping> = read_json(path)?;
            tracing::debug!(path = %path.display(), mappings = mappings.len(), "Loaded tenant mappings");
            Ok(mappings)
        }
        None => {
            tracing::debug!("No mapping file given, all pools will resolve to UNKNOWN");
            Ok(Vec::new())
        }
    }
}

pub fn load_rows(path: &Path) -> Result<Vec<MappingRow>> {
    read_json(path)
}
