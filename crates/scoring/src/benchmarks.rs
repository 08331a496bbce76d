//! Per-tenant historical benchmarks
//!
//! Computed once per scoring session from the tenant's closed leads and held
//! immutable for the life of the engine. Too little history for a statistic
//! falls back to its configured default.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use leadflow_config::ScoringConfig;
use leadflow_core::{Lead, LeadStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantBenchmarks {
    /// Average deal value among won leads
    pub avg_deal_value: f64,
    /// Won / (won + lost) per normalised source name
    pub source_win_rates: HashMap<String, f64>,
    /// Average activity count among won leads
    pub avg_activities: f64,
    /// Average days from creation to close among won and lost leads
    pub avg_days_to_close: f64,
}

impl Default for TenantBenchmarks {
    fn default() -> Self {
        Self::defaults(&ScoringConfig::default())
    }
}

impl TenantBenchmarks {
    /// Benchmarks for a tenant with no history
    pub fn defaults(config: &ScoringConfig) -> Self {
        Self {
            avg_deal_value: config.default_avg_deal_value,
            source_win_rates: HashMap::new(),
            avg_activities: config.default_avg_activities,
            avg_days_to_close: config.default_avg_days_to_close,
        }
    }

    /// Derive benchmarks from a tenant's leads
    ///
    /// `activity_counts` needs entries for won leads only; a won lead with no
    /// entry counts as zero activities.
    pub fn compute(
        leads: &[Lead],
        activity_counts: &HashMap<Uuid, usize>,
        config: &ScoringConfig,
    ) -> Self {
        let mut benchmarks = Self::defaults(config);
        let won: Vec<&Lead> = leads.iter().filter(|l| l.status == LeadStatus::Won).collect();

        let won_values: Vec<f64> = won
            .iter()
            .filter_map(|l| l.deal_value)
            .filter(|v| *v > 0.0)
            .collect();
        if let Some(avg) = trusted_mean(&won_values, config.min_history) {
            benchmarks.avg_deal_value = avg;
        }

        let won_activity: Vec<f64> = won
            .iter()
            .map(|l| activity_counts.get(&l.id).copied().unwrap_or(0) as f64)
            .collect();
        if let Some(avg) = trusted_mean(&won_activity, config.min_history) {
            benchmarks.avg_activities = avg;
        }

        let close_days: Vec<f64> = leads
            .iter()
            .filter(|l| l.status.is_terminal())
            .filter_map(|l| l.closed_at.map(|closed| l.days_open(closed)))
            .collect();
        if let Some(avg) = trusted_mean(&close_days, config.min_history) {
            benchmarks.avg_days_to_close = avg;
        }

        let mut outcomes: HashMap<String, (usize, usize)> = HashMap::new();
        for lead in leads.iter().filter(|l| l.status.is_terminal()) {
            let key = normalize_source(&lead.source);
            if key.is_empty() {
                continue;
            }
            let entry = outcomes.entry(key).or_default();
            if lead.status == LeadStatus::Won {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
        benchmarks.source_win_rates = outcomes
            .into_iter()
            .map(|(source, (won, lost))| (source, won as f64 / (won + lost) as f64))
            .collect();

        tracing::debug!(
            avg_deal_value = benchmarks.avg_deal_value,
            avg_activities = benchmarks.avg_activities,
            avg_days_to_close = benchmarks.avg_days_to_close,
            sources = benchmarks.source_win_rates.len(),
            "Tenant benchmarks computed"
        );

        benchmarks
    }

    /// Historical win rate of a source, if any lead from it has closed
    pub fn source_win_rate(&self, source: &str) -> Option<f64> {
        self.source_win_rates.get(&normalize_source(source)).copied()
    }

    pub fn with_source_win_rate(mut self, source: &str, rate: f64) -> Self {
        self.source_win_rates
            .insert(normalize_source(source), rate.clamp(0.0, 1.0));
        self
    }
}

/// Mean of `values` when there are enough samples and it is usable as a divisor
fn trusted_mean(values: &[f64], min_history: usize) -> Option<f64> {
    if values.is_empty() || values.len() < min_history {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (mean.is_finite() && mean > 0.0).then_some(mean)
}

pub(crate) fn normalize_source(source: &str) -> String {
    source.trim().to_lowercase()
}
