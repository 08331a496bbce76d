//! Batch rollups over scoring output
//!
//! Built purely from `ScoreResult`s. Won and lost leads only contribute to
//! the per-status counts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use leadflow_config::constants::insights::TOP_SOURCES;
use leadflow_config::ScoringConfig;
use leadflow_core::{LeadStatus, ScoreResult, ScoreTier};

/// Below this score a lead counts as at risk
const AT_RISK_SCORE: u8 = 40;
/// At or above this many risk factors a lead counts as at risk
const AT_RISK_FACTORS: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierDistribution {
    pub hot: usize,
    pub warm: usize,
    pub cool: usize,
    pub cold: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub leads: usize,
    pub average_score: f64,
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadSummary {
    pub lead_id: Uuid,
    pub name: String,
    pub status: LeadStatus,
    pub score: u8,
    pub tier: ScoreTier,
    pub win_probability: u8,
    pub next_action: String,
    pub risk_factors: Vec<String>,
}

impl From<&ScoreResult> for LeadSummary {
    fn from(result: &ScoreResult) -> Self {
        Self {
            lead_id: result.lead_id,
            name: result.lead_name.clone(),
            status: result.status,
            score: result.total_score,
            tier: result.tier,
            win_probability: result.win_probability,
            next_action: result.next_action.clone(),
            risk_factors: result.risk_factors.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantInsights {
    pub tenant_id: String,
    pub generated_at: DateTime<Utc>,
    pub open_leads: usize,
    pub total_score: u64,
    pub average_score: f64,
    pub distribution: TierDistribution,
    pub at_risk_count: usize,
    pub top_sources: Vec<SourceSummary>,
    pub hot_leads: Vec<LeadSummary>,
    pub at_risk_leads: Vec<LeadSummary>,
    pub pipeline_value: f64,
    /// Deal value weighted by win probability
    pub weighted_pipeline_value: f64,
    /// Every input lead, open or closed, keyed by status name
    pub status_counts: BTreeMap<&'static str, usize>,
}

pub fn is_at_risk(result: &ScoreResult) -> bool {
    result.total_score < AT_RISK_SCORE || result.risk_factors.len() >= AT_RISK_FACTORS
}

pub struct InsightsAggregator {
    top_n: usize,
}

impl InsightsAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.insights_top_n)
    }

    pub fn aggregate(
        &self,
        tenant_id: &str,
        results: &[ScoreResult],
        now: DateTime<Utc>,
    ) -> TenantInsights {
        let mut status_counts = BTreeMap::new();
        for result in results {
            *status_counts.entry(result.status.as_str()).or_insert(0) += 1;
        }

        let open: Vec<&ScoreResult> = results
            .iter()
            .filter(|r| !r.status.is_terminal())
            .collect();

        let mut distribution = TierDistribution::default();
        for result in &open {
            match result.tier {
                ScoreTier::Hot => distribution.hot += 1,
                ScoreTier::Warm => distribution.warm += 1,
                ScoreTier::Cool => distribution.cool += 1,
                ScoreTier::Cold => distribution.cold += 1,
            }
        }

        let total_score: u64 = open.iter().map(|r| r.total_score as u64).sum();
        let average_score = if open.is_empty() {
            0.0
        } else {
            total_score as f64 / open.len() as f64
        };

        let (pipeline_value, weighted_pipeline_value) = open
            .iter()
            .filter_map(|r| r.deal_value.filter(|v| v.is_finite() && *v > 0.0).map(|v| (v, r)))
            .fold((0.0, 0.0), |(total, weighted), (value, r)| {
                (total + value, weighted + value * r.win_probability as f64 / 100.0)
            });

        let mut by_score = open.clone();
        by_score.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        let hot_leads = by_score
            .iter()
            .take(self.top_n)
            .map(|r| LeadSummary::from(*r))
            .collect();

        let mut at_risk: Vec<&ScoreResult> =
            open.iter().copied().filter(|r| is_at_risk(r)).collect();
        at_risk.sort_by(|a, b| a.total_score.cmp(&b.total_score));
        let at_risk_count = at_risk.len();
        let at_risk_leads = at_risk
            .into_iter()
            .take(self.top_n)
            .map(LeadSummary::from)
            .collect();

        let insights = TenantInsights {
            tenant_id: tenant_id.to_string(),
            generated_at: now,
            open_leads: open.len(),
            total_score,
            average_score,
            distribution,
            at_risk_count,
            top_sources: top_sources(&open),
            hot_leads,
            at_risk_leads,
            pipeline_value,
            weighted_pipeline_value,
            status_counts,
        };

        tracing::info!(
            tenant_id = %tenant_id,
            open_leads = insights.open_leads,
            hot = distribution.hot,
            at_risk = at_risk_count,
            "Insights aggregated"
        );
        insights
    }
}

fn top_sources(open: &[&ScoreResult]) -> Vec<SourceSummary> {
    let mut groups: HashMap<String, (usize, u64)> = HashMap::new();
    for result in open {
        let source = match result.source.trim() {
            "" => "unknown".to_string(),
            s => s.to_string(),
        };
        let entry = groups.entry(source).or_default();
        entry.0 += 1;
        entry.1 += result.total_score as u64;
    }

    let mut sources: Vec<SourceSummary> = groups
        .into_iter()
        .map(|(source, (leads, sum))| SourceSummary {
            source,
            leads,
            average_score: sum as f64 / leads as f64,
        })
        .collect();
    // name breaks ties so output is stable
    sources.sort_by(|a, b| {
        b.average_score
            .total_cmp(&a.average_score)
            .then_with(|| a.source.cmp(&b.source))
    });
    sources.truncate(TOP_SOURCES);
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::ScoreBreakdown;

    fn result(score: u8, status: LeadStatus, source: &str, risks: usize) -> ScoreResult {
        ScoreResult {
            lead_id: Uuid::new_v4(),
            lead_name: format!("lead {}", score),
            status,
            source: source.to_string(),
            deal_value: Some(10_000.0),
            breakdown: ScoreBreakdown::default(),
            total_score: score,
            tier: ScoreTier::from_score(score),
            win_probability: 50,
            predicted_close_days: None,
            next_action: String::new(),
            reasons: Vec::new(),
            risk_factors: (0..risks).map(|i| format!("risk {}", i)).collect(),
            scored_at: Utc::now(),
        }
    }

    #[test]
    fn test_distribution_excludes_closed_leads() {
        let results = vec![
            result(85, LeadStatus::Qualified, "Referral", 0),
            result(55, LeadStatus::Contacted, "Referral", 0),
            result(35, LeadStatus::New, "Ads", 0),
            result(10, LeadStatus::New, "Ads", 0),
            result(90, LeadStatus::Won, "Referral", 0),
            result(5, LeadStatus::Lost, "Ads", 0),
        ];
        let insights = InsightsAggregator::new(10).aggregate("t1", &results, Utc::now());

        assert_eq!(insights.open_leads, 4);
        assert_eq!(
            insights.distribution,
            TierDistribution {
                hot: 1,
                warm: 1,
                cool: 1,
                cold: 1
            }
        );
        assert_eq!(insights.total_score, 185);
        assert!((insights.average_score - 46.25).abs() < 1e-9);
        assert_eq!(insights.status_counts.get("won"), Some(&1));
        assert_eq!(insights.status_counts.get("new"), Some(&2));
        assert!((insights.pipeline_value - 40_000.0).abs() < 1e-6);
        assert!((insights.weighted_pipeline_value - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_at_risk_rule() {
        assert!(is_at_risk(&result(39, LeadStatus::New, "", 0)));
        assert!(is_at_risk(&result(80, LeadStatus::New, "", 2)));
        assert!(!is_at_risk(&result(40, LeadStatus::New, "", 1)));
    }

    #[test]
    fn test_leaderboards_respect_top_n_and_order() {
        let results: Vec<ScoreResult> = [72, 15, 90, 30, 60]
            .into_iter()
            .map(|s| result(s, LeadStatus::Contacted, "Web", 0))
            .collect();
        let insights = InsightsAggregator::new(2).aggregate("t1", &results, Utc::now());

        let hot: Vec<u8> = insights.hot_leads.iter().map(|l| l.score).collect();
        assert_eq!(hot, vec![90, 72]);
        let risky: Vec<u8> = insights.at_risk_leads.iter().map(|l| l.score).collect();
        assert_eq!(risky, vec![15, 30]);
        assert_eq!(insights.at_risk_count, 2);
    }

    #[test]
    fn test_top_sources_sorted_and_capped() {
        let mut results = Vec::new();
        for (i, source) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
            results.push(result(10 * (i as u8 + 1), LeadStatus::New, source, 0));
        }
        results.push(result(50, LeadStatus::New, "  ", 0));

        let insights = InsightsAggregator::new(10).aggregate("t1", &results, Utc::now());
        let names: Vec<&str> = insights.top_sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["F", "E", "unknown", "D", "C"]);
    }

    #[test]
    fn test_empty_input() {
        let insights = InsightsAggregator::new(10).aggregate("t1", &[], Utc::now());
        assert_eq!(insights.open_leads, 0);
        assert_eq!(insights.average_score, 0.0);
        assert!(insights.top_sources.is_empty());
        assert!(insights.status_counts.is_empty());
    }
}
