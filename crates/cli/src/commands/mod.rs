//! CLI command implementations

pub mod alerts;
pub mod mappings;
pub mod report;

use crate::config::ReportConfig;
use crate::output::OutputFormat;

/// Settings shared by every command
pub struct CommandContext {
    pub config: ReportConfig,
    pub format: OutputFormat,
}
