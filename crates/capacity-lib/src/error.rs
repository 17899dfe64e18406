//! Error types for the capacity engine

use chrono::NaiveDate;

/// Errors raised while resolving or aggregating inventory records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapacityError {
    #[error("invalid record for pool '{pool}' on '{system}': {reason}")]
    InvalidRecord {
        pool: String,
        system: String,
        reason: String,
    },

    #[error("snapshot is empty")]
    EmptySnapshot,

    #[error("date range starts at {from}, after its end {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// Contract violations detected while assembling the tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("node '{label}' references missing parent '{parent_label}'")]
    MissingParent { label: String, parent_label: String },

    #[error("label '{0}' appears more than once")]
    DuplicateLabel(String),

    #[error("expected exactly one root node, found {0}")]
    RootCount(usize),
}

/// Per-row rejection reasons for bulk mapping imports
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingImportError {
    #[error("Row {row}: Missing tenant or pool")]
    MissingField { row: usize },

    #[error("Row {row}: Tenant '{tenant}' not found")]
    UnknownTenant { row: usize, tenant: String },
}

pub type Result<T> = std::result::Result<T, CapacityError>;
