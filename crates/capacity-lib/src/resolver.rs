//! Tenant mapping resolution
//!
//! Assigns every pool record to exactly one tenant. Pools without a matching
//! mapping fall into the UNKNOWN tenant of their own storage system.
//!
//! When several mappings match one pool the winner is chosen by:
//! 1. a system-qualified mapping over a wildcard mapping
//! 2. the most recent `created_at`
//! 3. the higher mapping `id`

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{CapacityError, Result};
use crate::models::{MatchKind, PoolRecord, ResolvedEntry, Tenant, TenantMapping};

/// Resolve each pool to its tenant
pub fn resolve(pools: &[PoolRecord], mappings: &[TenantMapping]) -> Result<Vec<ResolvedEntry>> {
    let index = MappingIndex::new(mappings);
    pools.iter().map(|pool| index.resolve_pool(pool)).collect()
}

/// Mappings grouped by pool name
pub struct MappingIndex<'a> {
    by_pool: HashMap<&'a str, Vec<&'a TenantMapping>>,
}

impl<'a> MappingIndex<'a> {
    pub fn new(mappings: &'a [TenantMapping]) -> Self {
        let mut by_pool: HashMap<&str, Vec<&TenantMapping>> = HashMap::new();
        for mapping in mappings {
            by_pool
                .entry(mapping.pool_name.as_str())
                .or_default()
                .push(mapping);
        }
        Self { by_pool }
    }

    /// All mappings that apply to the pool, best candidate first
    pub fn candidates(&self, pool_name: &str, storage_system: &str) -> Vec<&'a TenantMapping> {
        let mut matching: Vec<&TenantMapping> = self
            .by_pool
            .get(pool_name)
            .map(|list| {
                list.iter()
                    .copied()
                    .filter(|m| m.matches(pool_name, storage_system))
                    .collect()
            })
            .unwrap_or_default();
        matching.sort_by(|a, b| precedence(b, a));
        matching
    }

    pub fn resolve_pool(&self, pool: &PoolRecord) -> Result<ResolvedEntry> {
        validate(pool)?;

        let candidates = self.candidates(&pool.name, &pool.storage_system);
        let (tenant, match_kind) = match candidates.first() {
            Some(mapping) if mapping.is_system_qualified() => (
                Tenant::Named(mapping.tenant_name.clone()),
                MatchKind::SystemQualified,
            ),
            Some(mapping) => (
                Tenant::Named(mapping.tenant_name.clone()),
                MatchKind::Wildcard,
            ),
            None => (Tenant::Unknown, MatchKind::Unmapped),
        };

        Ok(ResolvedEntry {
            pool: pool.name.clone(),
            system: pool.storage_system.clone(),
            tenant,
            total_capacity: pool.total_capacity,
            used_capacity: pool.used_capacity,
            match_kind,
            shadowed: candidates.len().saturating_sub(1),
        })
    }
}

/// Ordering of two matching mappings; `Greater` means `a` wins
fn precedence(a: &TenantMapping, b: &TenantMapping) -> Ordering {
    a.is_system_qualified()
        .cmp(&b.is_system_qualified())
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub(crate) fn validate(pool: &PoolRecord) -> Result<()> {
    let reason = if !pool.total_capacity.is_finite() || !pool.used_capacity.is_finite() {
        Some("capacity is not a finite number".to_string())
    } else if pool.total_capacity < 0.0 {
        Some(format!("negative total capacity {}", pool.total_capacity))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CapacityError::InvalidRecord {
            pool: pool.name.clone(),
            system: pool.storage_system.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn pool(name: &str, system: &str) -> PoolRecord {
        PoolRecord::new(name, system, 100.0, 50.0, date())
    }

    fn mapping(id: u64, tenant: &str, pool: &str, system: Option<&str>, age_days: i64) -> TenantMapping {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TenantMapping {
            id,
            tenant_name: tenant.to_string(),
            pool_name: pool.to_string(),
            storage_system: system.map(str::to_string),
            created_at: base - Duration::days(age_days),
        }
    }

    #[test]
    fn test_unmapped_pool_falls_back_to_unknown() {
        let entries = resolve(&[pool("P3", "SysB")], &[]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tenant, Tenant::Unknown);
        assert_eq!(entries[0].system, "SysB");
        assert_eq!(entries[0].match_kind, MatchKind::Unmapped);
        assert_eq!(entries[0].shadowed, 0);
    }

    #[test]
    fn test_wildcard_mapping_applies_to_any_system() {
        let mappings = [mapping(1, "Alpha", "P1", None, 0)];
        let entries = resolve(&[pool("P1", "SysA"), pool("P1", "SysB")], &mappings).unwrap();
        assert!(entries
            .iter()
            .all(|e| e.tenant == Tenant::Named("Alpha".into()) && e.match_kind == MatchKind::Wildcard));
    }

    #[test]
    fn test_qualified_mapping_ignores_other_systems() {
        let mappings = [mapping(1, "Alpha", "P1", Some("SysA"), 0)];
        let entries = resolve(&[pool("P1", "SysA"), pool("P1", "SysB")], &mappings).unwrap();
        assert_eq!(entries[0].tenant, Tenant::Named("Alpha".into()));
        assert_eq!(entries[0].match_kind, MatchKind::SystemQualified);
        assert_eq!(entries[1].tenant, Tenant::Unknown);
    }

    #[test]
    fn test_tie_break_prefers_system_qualified_over_newer_wildcard() {
        let mappings = [
            mapping(1, "Qualified", "P1", Some("SysA"), 30),
            mapping(2, "Wildcard", "P1", None, 0),
        ];
        let entries = resolve(&[pool("P1", "SysA")], &mappings).unwrap();
        assert_eq!(entries[0].tenant, Tenant::Named("Qualified".into()));
        assert_eq!(entries[0].shadowed, 1);
    }

    #[test]
    fn test_tie_break_prefers_most_recent_mapping() {
        let mappings = [
            mapping(7, "Newer", "P1", None, 1),
            mapping(3, "Older", "P1", None, 10),
        ];
        let entries = resolve(&[pool("P1", "SysA")], &mappings).unwrap();
        assert_eq!(entries[0].tenant, Tenant::Named("Newer".into()));
    }

    #[test]
    fn test_tie_break_falls_back_to_higher_id() {
        let mappings = [
            mapping(9, "Second", "P1", Some("SysA"), 5),
            mapping(4, "First", "P1", Some("SysA"), 5),
        ];
        let forward = resolve(&[pool("P1", "SysA")], &mappings).unwrap();
        let reversed: Vec<_> = mappings.iter().rev().cloned().collect();
        let backward = resolve(&[pool("P1", "SysA")], &reversed).unwrap();

        assert_eq!(forward[0].tenant, Tenant::Named("Second".into()));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_negative_total_capacity_is_rejected() {
        let mut bad = pool("P1", "SysA");
        bad.total_capacity = -1.0;
        let err = resolve(&[bad], &[]).unwrap_err();
        assert!(matches!(err, CapacityError::InvalidRecord { ref pool, .. } if pool == "P1"));
    }

    #[test]
    fn test_non_finite_capacity_is_rejected() {
        let mut bad = pool("P1", "SysA");
        bad.used_capacity = f64::NAN;
        assert!(resolve(&[bad], &[]).is_err());
    }

    #[test]
    fn test_used_above_total_passes_through() {
        let mut over = pool("P1", "SysA");
        over.used_capacity = 150.0;
        let entries = resolve(&[over], &[]).unwrap();
        assert_eq!(entries[0].used_capacity, 150.0);
        assert_eq!(entries[0].utilization_pct(), 150.0);
    }
}
