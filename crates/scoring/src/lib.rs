//! Lead scoring and pipeline insights
//!
//! Features:
//! - Per-tenant benchmarks computed from closed-lead history
//! - Five bounded sub-scores with reasons and risk factors
//! - Win probability, predicted days to close and next best action
//! - Scheduled refresh that persists scores back to the store
//! - Tenant-level rollups for dashboards

pub mod benchmarks;
pub mod engine;
pub mod error;
pub mod insights;
pub mod model;
pub mod next_action;

pub use benchmarks::TenantBenchmarks;
pub use engine::{RefreshSummary, ScoringEngine};
pub use error::{Result, ScoringError};
pub use insights::{
    is_at_risk, InsightsAggregator, LeadSummary, SourceSummary, TenantInsights, TierDistribution,
};
pub use model::{predicted_close_days, score_lead, win_probability};
pub use next_action::{next_best_action, NextActionRule, NEXT_ACTION_RULES};
