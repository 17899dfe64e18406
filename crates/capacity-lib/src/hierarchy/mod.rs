//! Presentation structures built from aggregate nodes
//!
//! - a parent-labeled tree for hierarchical (treemap) renderers
//! - a flat per-tenant table for comparison views

mod table;
mod tree;

pub use table::build_comparison_table;
pub use tree::build_tree;
