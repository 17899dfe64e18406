//! Capacity aggregation library for storage reporting
//!
//! This crate provides the core functionality for:
//! - Resolving pools to tenants, with a per-system UNKNOWN fallback
//! - Simple and weighted utilization across System → Tenant → Pool
//! - Tree and comparison-table assembly for dashboards
//! - Utilization alerts and bulk mapping import
//! - Observability for report builds

pub mod aggregate;
pub mod alerts;
pub mod error;
pub mod hierarchy;
pub mod mapping_import;
pub mod models;
pub mod observability;
pub mod report;
pub mod resolver;

pub use aggregate::Aggregator;
pub use error::{CapacityError, HierarchyError, MappingImportError};
pub use hierarchy::{build_comparison_table, build_tree};
pub use models::*;
pub use observability::{ReportLogger, ReportMetrics};
pub use report::{
    CapacityReport, DataQualityIssue, ReportBuilder, ReportRequest, Snapshot, TrendPoint,
};
pub use resolver::resolve;
