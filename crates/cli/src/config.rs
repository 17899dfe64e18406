//! Configuration management for the CLI

use anyhow::{Context, Result};
use capacity_lib::alerts::AlertThresholds;
use capacity_lib::{UtilizationView, DEFAULT_ROOT_LABEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Report configuration
///
/// Layered from built-in defaults, an optional config file and `CAPVIEW_*`
/// environment variables, in that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Label of the hierarchy root
    #[serde(default = "default_root_label")]
    pub root_label: String,

    /// Utilization view used when `--view` is not given
    #[serde(default)]
    pub default_view: UtilizationView,

    #[serde(default = "default_warning_pct")]
    pub warning_pct: f64,

    #[serde(default = "default_critical_pct")]
    pub critical_pct: f64,

    #[serde(default = "default_emergency_pct")]
    pub emergency_pct: f64,

    /// Decimals shown for percentages
    #[serde(default = "default_precision")]
    pub precision: usize,
}

fn default_root_label() -> String {
    DEFAULT_ROOT_LABEL.to_string()
}

fn default_warning_pct() -> f64 {
    90.0
}

fn default_critical_pct() -> f64 {
    98.0
}

fn default_emergency_pct() -> f64 {
    100.0
}

fn default_precision() -> usize {
    1
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            root_label: default_root_label(),
            default_view: UtilizationView::default(),
            warning_pct: default_warning_pct(),
            critical_pct: default_critical_pct(),
            emergency_pct: default_emergency_pct(),
            precision: default_precision(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match explicit {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("CAPVIEW"))
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Default config file location
    fn default_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("capview").join("config.toml"))
    }

    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            warning_pct: self.warning_pct,
            critical_pct: self.critical_pct,
            emergency_pct: self.emergency_pct,
        }
    }
}
