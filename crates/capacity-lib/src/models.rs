//! Core data models for capacity reporting

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel tenant name for pools without a mapping
pub const UNKNOWN_TENANT: &str = "UNKNOWN";

/// Default label of the hierarchy root
pub const DEFAULT_ROOT_LABEL: &str = "All Storage";

/// Separator between the segments of a node label
pub const LABEL_SEPARATOR: char = '/';

/// One storage pool snapshot for a report date. Capacities are in GiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub name: String,
    pub storage_system: String,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub report_date: NaiveDate,
    /// Observed growth in GiB per day, when the inventory export carries it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_growth: Option<f64>,
}

impl PoolRecord {
    pub fn new(
        name: impl Into<String>,
        storage_system: impl Into<String>,
        total_capacity: f64,
        used_capacity: f64,
        report_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            storage_system: storage_system.into(),
            total_capacity,
            used_capacity,
            report_date,
            recent_growth: None,
        }
    }

    pub fn with_recent_growth(mut self, growth: f64) -> Self {
        self.recent_growth = Some(growth);
        self
    }

    pub fn utilization_pct(&self) -> f64 {
        utilization_pct(self.used_capacity, self.total_capacity)
    }
}

/// Assignment of a pool to a tenant
///
/// A mapping without `storage_system` is a wildcard and applies to a pool of
/// that name on any system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantMapping {
    pub id: u64,
    pub tenant_name: String,
    pub pool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_system: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TenantMapping {
    /// Whether this mapping applies to the given pool
    pub fn matches(&self, pool_name: &str, storage_system: &str) -> bool {
        self.pool_name == pool_name
            && self
                .storage_system
                .as_deref()
                .map_or(true, |system| system == storage_system)
    }

    pub fn is_system_qualified(&self) -> bool {
        self.storage_system.is_some()
    }
}

/// Tenant a pool resolved to
///
/// Tenant groups are always identified together with their storage system, so
/// `Unknown` on two systems forms two separate groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenant {
    Named(String),
    Unknown,
}

impl Tenant {
    pub fn name(&self) -> &str {
        match self {
            Tenant::Named(name) => name,
            Tenant::Unknown => UNKNOWN_TENANT,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Tenant::Unknown)
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a pool's tenant was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    SystemQualified,
    Wildcard,
    Unmapped,
}

/// Pool with its resolved tenant and capacity figures
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub pool: String,
    pub system: String,
    pub tenant: Tenant,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub match_kind: MatchKind,
    /// Other matching mappings that lost the tie-break
    pub shadowed: usize,
}

impl ResolvedEntry {
    pub fn utilization_pct(&self) -> f64 {
        utilization_pct(self.used_capacity, self.total_capacity)
    }
}

/// Level of the System → Tenant → Pool hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Root,
    System,
    Tenant,
    Pool,
}

/// Identity of an aggregate group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum NodeKey {
    Root,
    System {
        system: String,
    },
    Tenant {
        system: String,
        tenant: Tenant,
    },
    Pool {
        system: String,
        tenant: Tenant,
        pool: String,
    },
}

impl NodeKey {
    pub fn level(&self) -> Level {
        match self {
            NodeKey::Root => Level::Root,
            NodeKey::System { .. } => Level::System,
            NodeKey::Tenant { .. } => Level::Tenant,
            NodeKey::Pool { .. } => Level::Pool,
        }
    }

    /// Key of the enclosing group, `None` at the root
    pub fn parent(&self) -> Option<NodeKey> {
        match self {
            NodeKey::Root => None,
            NodeKey::System { .. } => Some(NodeKey::Root),
            NodeKey::Tenant { system, .. } => Some(NodeKey::System {
                system: system.clone(),
            }),
            NodeKey::Pool { system, tenant, .. } => Some(NodeKey::Tenant {
                system: system.clone(),
                tenant: tenant.clone(),
            }),
        }
    }

    /// Unique label of this group
    ///
    /// Labels are paths from the root (`All Storage/SysA/Alpha/P1`). A `\`
    /// or `/` inside a name is escaped with a backslash, so distinct keys
    /// never share a label, whatever the system, tenant and root names are.
    pub fn label(&self, root_label: &str) -> String {
        let segments: Vec<&str> = match self {
            NodeKey::Root => Vec::new(),
            NodeKey::System { system } => vec![system.as_str()],
            NodeKey::Tenant { system, tenant } => vec![system.as_str(), tenant.name()],
            NodeKey::Pool {
                system,
                tenant,
                pool,
            } => vec![system.as_str(), tenant.name(), pool.as_str()],
        };

        let mut label = String::new();
        push_segment(&mut label, root_label);
        for segment in segments {
            label.push(LABEL_SEPARATOR);
            push_segment(&mut label, segment);
        }
        label
    }

    /// Display name of this group (root label supplied by the caller)
    pub fn display_name<'a>(&'a self, root_label: &'a str) -> &'a str {
        match self {
            NodeKey::Root => root_label,
            NodeKey::System { system } => system,
            NodeKey::Tenant { tenant, .. } => tenant.name(),
            NodeKey::Pool { pool, .. } => pool,
        }
    }
}

fn push_segment(label: &mut String, segment: &str) {
    for c in segment.chars() {
        if c == '\\' || c == LABEL_SEPARATOR {
            label.push('\\');
        }
        label.push(c);
    }
}

/// Aggregated capacity figures for one group at one level
///
/// `label` is the group's path label (see [`NodeKey::label`]) and is unique
/// across all levels; `name` is what a renderer shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateNode {
    pub key: NodeKey,
    pub label: String,
    pub name: String,
    /// Label of the parent group, empty at the root
    pub parent_label: String,
    pub total_capacity: f64,
    pub used_capacity: f64,
    /// `total - used`, negative when the input reports `used > total`
    pub available_capacity: f64,
    pub member_count: usize,
    /// Sum of the members' own utilization percentages
    pub utilization_sum: f64,
    pub simple_avg_utilization_pct: f64,
    pub weighted_avg_utilization_pct: f64,
}

impl AggregateNode {
    pub fn level(&self) -> Level {
        self.key.level()
    }
}

/// Which utilization figure a presentation structure carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationView {
    Simple,
    #[default]
    Weighted,
}

impl std::str::FromStr for UtilizationView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "weighted" => Ok(Self::Weighted),
            other => Err(format!("unknown utilization view '{other}'")),
        }
    }
}

/// Node of the parent-labeled tree handed to hierarchical renderers
///
/// `label` is unique within one tree; `name` is the display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub label: String,
    pub name: String,
    pub parent_label: String,
    pub level: Level,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub available_capacity: f64,
    pub utilization_pct: f64,
}

/// One tenant row of the comparison table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRow {
    pub tenant: String,
    #[serde(default)]
    pub systems: Vec<String>,
    #[serde(default)]
    pub pools: Vec<String>,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub simple_avg_pct: f64,
    pub weighted_avg_pct: f64,
}

/// Utilization of a single entity; zero capacity yields 0 rather than NaN
pub fn utilization_pct(used: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        used / total * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_zero_capacity() {
        assert_eq!(utilization_pct(0.0, 0.0), 0.0);
        assert_eq!(utilization_pct(5.0, 0.0), 0.0);
        assert_eq!(utilization_pct(50.0, 200.0), 25.0);
    }

    #[test]
    fn test_mapping_matches_wildcard_and_qualified() {
        let created_at = Utc::now();
        let wildcard = TenantMapping {
            id: 1,
            tenant_name: "Alpha".into(),
            pool_name: "P1".into(),
            storage_system: None,
            created_at,
        };
        let qualified = TenantMapping {
            storage_system: Some("SysA".into()),
            ..wildcard.clone()
        };

        assert!(wildcard.matches("P1", "SysA"));
        assert!(wildcard.matches("P1", "SysB"));
        assert!(qualified.matches("P1", "SysA"));
        assert!(!qualified.matches("P1", "SysB"));
        assert!(!qualified.matches("P2", "SysA"));
    }

    #[test]
    fn test_node_key_parents() {
        let pool = NodeKey::Pool {
            system: "SysA".into(),
            tenant: Tenant::Unknown,
            pool: "P3".into(),
        };
        let tenant = pool.parent().unwrap();
        assert_eq!(
            tenant,
            NodeKey::Tenant {
                system: "SysA".into(),
                tenant: Tenant::Unknown
            }
        );
        let system = tenant.parent().unwrap();
        assert_eq!(system.parent(), Some(NodeKey::Root));
        assert_eq!(NodeKey::Root.parent(), None);
        assert_eq!(pool.display_name("All Storage"), "P3");
        assert_eq!(tenant.display_name("All Storage"), UNKNOWN_TENANT);
    }

    #[test]
    fn test_labels_are_root_paths() {
        let pool = NodeKey::Pool {
            system: "SysA".into(),
            tenant: Tenant::Named("Alpha".into()),
            pool: "P1".into(),
        };
        assert_eq!(NodeKey::Root.label("All Storage"), "All Storage");
        assert_eq!(pool.label("All Storage"), "All Storage/SysA/Alpha/P1");
        assert_eq!(
            pool.parent().unwrap().label("All Storage"),
            "All Storage/SysA/Alpha"
        );
    }

    #[test]
    fn test_labels_escape_separators_in_names() {
        let slashed = NodeKey::System {
            system: "A/B".into(),
        };
        let nested = NodeKey::Tenant {
            system: "A".into(),
            tenant: Tenant::Named("B".into()),
        };
        assert_eq!(slashed.label("Root"), "Root/A\\/B");
        assert_eq!(nested.label("Root"), "Root/A/B");

        let backslashed = NodeKey::System {
            system: "A\\".into(),
        };
        assert_eq!(backslashed.label("Root"), "Root/A\\\\");
        assert_ne!(slashed.label("Root"), backslashed.label("Root"));
    }

    #[test]
    fn test_system_named_like_root_gets_own_label() {
        let system = NodeKey::System {
            system: DEFAULT_ROOT_LABEL.into(),
        };
        assert_ne!(system.label(DEFAULT_ROOT_LABEL), NodeKey::Root.label(DEFAULT_ROOT_LABEL));
    }

    #[test]
    fn test_view_parsing() {
        assert_eq!("Weighted".parse::<UtilizationView>(), Ok(UtilizationView::Weighted));
        assert_eq!("simple".parse::<UtilizationView>(), Ok(UtilizationView::Simple));
        assert!("median".parse::<UtilizationView>().is_err());
    }

    #[test]
    fn test_pool_record_defaults_growth() {
        let json = r#"{"name":"P1","storage_system":"SysA","total_capacity":10.0,"used_capacity":4.0,"report_date":"2024-03-01"}"#;
        let pool: PoolRecord = serde_json::from_str(json).unwrap();
        assert_eq!(pool.recent_growth, None);
        assert_eq!(pool.utilization_pct(), 40.0);
    }
}
