//! Pool utilization alerts
//!
//! Classifies pools against utilization thresholds and estimates how many
//! days remain before a pool fills up.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::PoolRecord;

/// Growth rate floor when observed growth is available (percent per day)
const MIN_DAILY_GROWTH_PCT: f64 = 0.1;

/// Alert severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
    Emergency,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
            AlertLevel::Emergency => "emergency",
        };
        f.write_str(name)
    }
}

/// Utilization percentages at which each alert level starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub warning_pct: f64,
    pub critical_pct: f64,
    pub emergency_pct: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            warning_pct: 90.0,
            critical_pct: 98.0,
            emergency_pct: 100.0,
        }
    }
}

impl AlertThresholds {
    pub fn classify(&self, utilization_pct: f64) -> Option<AlertLevel> {
        if utilization_pct >= self.emergency_pct {
            Some(AlertLevel::Emergency)
        } else if utilization_pct >= self.critical_pct {
            Some(AlertLevel::Critical)
        } else if utilization_pct >= self.warning_pct {
            Some(AlertLevel::Warning)
        } else {
            None
        }
    }
}

/// Alert raised for one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAlert {
    pub pool_name: String,
    pub storage_system: String,
    pub utilization_pct: f64,
    pub level: AlertLevel,
    pub days_until_full: u32,
    pub message: String,
}

/// Estimated days until a pool reaches 100%
///
/// Without observed growth the daily growth is assumed from the current
/// utilization: 2% above 95%, 1.5% above 80%, 1% otherwise. Observed growth
/// (GiB per day) replaces the assumption when positive.
pub fn days_until_full(current_pct: f64, growth: Option<f64>, total_capacity: f64) -> u32 {
    if current_pct.is_nan() || current_pct >= 100.0 {
        return 0;
    }

    let mut daily_growth_pct = if current_pct > 95.0 {
        2.0
    } else if current_pct > 80.0 {
        1.5
    } else {
        1.0
    };

    if let Some(growth) = growth {
        if total_capacity > 0.0 {
            let observed_pct = growth / total_capacity * 100.0;
            if observed_pct > 0.0 {
                daily_growth_pct = observed_pct.max(MIN_DAILY_GROWTH_PCT);
            }
        }
    }

    let days = (100.0 - current_pct) / daily_growth_pct;
    // saturating float-to-int cast
    days.max(0.0) as u32
}

/// Alerts for every pool at or above the warning threshold, most utilized first
pub fn generate_alerts(pools: &[PoolRecord], thresholds: &AlertThresholds) -> Vec<CapacityAlert> {
    let mut alerts: Vec<CapacityAlert> = pools
        .iter()
        .filter_map(|pool| {
            let utilization_pct = pool.utilization_pct();
            let level = thresholds.classify(utilization_pct)?;
            let days = days_until_full(utilization_pct, pool.recent_growth, pool.total_capacity);

            let mut message = format!(
                "Pool '{}' on system '{}' is at {:.1}% utilization. ",
                pool.name, pool.storage_system, utilization_pct
            );
            if days > 0 {
                message.push_str(&format!("Estimated {days} days until full."));
            } else {
                message.push_str("Immediate action required!");
            }

            Some(CapacityAlert {
                pool_name: pool.name.clone(),
                storage_system: pool.storage_system.clone(),
                utilization_pct,
                level,
                days_until_full: days,
                message,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.utilization_pct
            .total_cmp(&a.utilization_pct)
            .then_with(|| a.storage_system.cmp(&b.storage_system))
            .then_with(|| a.pool_name.cmp(&b.pool_name))
    });
    alerts
}
