//! Scoring session configuration
//!
//! The scoring coefficients themselves are fixed; this only covers the
//! benchmark fallbacks and the size of the insight rollups.

use serde::{Deserialize, Serialize};

use crate::constants::{benchmarks, insights};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Used when the tenant has too few won deals with a value
    #[serde(default = "default_avg_deal_value")]
    pub default_avg_deal_value: f64,

    /// Used when the tenant has too few won leads
    #[serde(default = "default_avg_activities")]
    pub default_avg_activities: f64,

    /// Used when the tenant has too few closed leads
    #[serde(default = "default_avg_days_to_close")]
    pub default_avg_days_to_close: f64,

    /// Samples required before a historical average replaces its default
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    /// Length of the hot / at-risk leaderboards
    #[serde(default = "default_top_n")]
    pub insights_top_n: usize,
}

fn default_avg_deal_value() -> f64 {
    benchmarks::DEFAULT_AVG_DEAL_VALUE
}

fn default_avg_activities() -> f64 {
    benchmarks::DEFAULT_AVG_ACTIVITIES
}

fn default_avg_days_to_close() -> f64 {
    benchmarks::DEFAULT_AVG_DAYS_TO_CLOSE
}

fn default_min_history() -> usize {
    benchmarks::MIN_HISTORY
}

fn default_top_n() -> usize {
    insights::TOP_N
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_avg_deal_value: default_avg_deal_value(),
            default_avg_activities: default_avg_activities(),
            default_avg_days_to_close: default_avg_days_to_close(),
            min_history: default_min_history(),
            insights_top_n: default_top_n(),
        }
    }
}
