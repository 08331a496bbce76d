//! Tenant-scoped scoring session
//!
//! Benchmarks are computed once when the engine is built and shared by every
//! scoring call it makes. Build a new engine to pick up fresh history.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use leadflow_config::ScoringConfig;
use leadflow_core::{Clock, Lead, LeadStatus, ScoreResult};
use leadflow_persistence::{ActivityStore, LeadStore, PersistenceError};

use crate::benchmarks::TenantBenchmarks;
use crate::error::{Result, ScoringError};
use crate::insights::{InsightsAggregator, TenantInsights};
use crate::model;

/// Outcome of a scheduled score refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub tenant_id: String,
    /// Leads whose scores were persisted
    pub scored: usize,
    /// Leads that disappeared between listing and writing
    pub skipped: usize,
    pub duration_ms: u64,
}

pub struct ScoringEngine {
    tenant_id: String,
    leads: Arc<dyn LeadStore>,
    activities: Arc<dyn ActivityStore>,
    clock: Arc<dyn Clock>,
    benchmarks: TenantBenchmarks,
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Build an engine for `tenant_id`, computing benchmarks from its history
    pub async fn for_tenant(
        tenant_id: &str,
        leads: Arc<dyn LeadStore>,
        activities: Arc<dyn ActivityStore>,
        clock: Arc<dyn Clock>,
        config: ScoringConfig,
    ) -> Result<Self> {
        let history = leads.list_for_tenant(tenant_id).await?;

        let mut activity_counts = HashMap::new();
        for lead in history.iter().filter(|l| l.status == LeadStatus::Won) {
            let count = activities.count_for_lead(tenant_id, lead.id).await?;
            activity_counts.insert(lead.id, count);
        }

        let benchmarks = TenantBenchmarks::compute(&history, &activity_counts, &config);
        tracing::info!(
            tenant_id = %tenant_id,
            leads = history.len(),
            won = activity_counts.len(),
            "Scoring engine ready"
        );

        Ok(Self::with_benchmarks(
            tenant_id, leads, activities, clock, config, benchmarks,
        ))
    }

    /// Build an engine around precomputed benchmarks
    pub fn with_benchmarks(
        tenant_id: &str,
        leads: Arc<dyn LeadStore>,
        activities: Arc<dyn ActivityStore>,
        clock: Arc<dyn Clock>,
        config: ScoringConfig,
        benchmarks: TenantBenchmarks,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            leads,
            activities,
            clock,
            benchmarks,
            config,
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn benchmarks(&self) -> &TenantBenchmarks {
        &self.benchmarks
    }

    /// Score one lead of this engine's tenant
    pub async fn score_lead(&self, lead: &Lead) -> Result<ScoreResult> {
        if lead.tenant_id != self.tenant_id {
            return Err(ScoringError::TenantMismatch {
                expected: self.tenant_id.clone(),
                found: lead.tenant_id.clone(),
            });
        }

        let activities = self
            .activities
            .list_for_lead(&self.tenant_id, lead.id, None)
            .await?;
        let result = model::score_lead(lead, &activities, &self.benchmarks, self.clock.now());

        tracing::debug!(
            tenant_id = %self.tenant_id,
            lead_id = %lead.id,
            score = result.total_score,
            tier = result.tier.display_name(),
            "Lead scored"
        );
        Ok(result)
    }

    /// Score every lead of the tenant, highest score first
    pub async fn score_all_leads(&self) -> Result<Vec<ScoreResult>> {
        let leads = self.leads.list_for_tenant(&self.tenant_id).await?;
        let mut results = Vec::with_capacity(leads.len());
        for lead in &leads {
            results.push(self.score_lead(lead).await?);
        }
        results.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        Ok(results)
    }

    /// Rescore every lead and persist the results
    pub async fn refresh_scores(&self) -> Result<RefreshSummary> {
        let started = Instant::now();
        let results = self.score_all_leads().await?;

        let mut scored = 0;
        let mut skipped = 0;
        for result in &results {
            match self
                .leads
                .update_scores(&self.tenant_id, result.lead_id, &result.snapshot())
                .await
            {
                Ok(()) => scored += 1,
                Err(PersistenceError::NotFound(_)) => {
                    tracing::warn!(
                        tenant_id = %self.tenant_id,
                        lead_id = %result.lead_id,
                        "Lead vanished before its score could be saved"
                    );
                    skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let elapsed = started.elapsed();
        metrics::counter!("leadflow_leads_scored_total").increment(scored as u64);
        metrics::histogram!("leadflow_score_refresh_seconds").record(elapsed.as_secs_f64());
        tracing::info!(
            tenant_id = %self.tenant_id,
            scored,
            skipped,
            duration_ms = elapsed.as_millis() as u64,
            "Score refresh complete"
        );

        Ok(RefreshSummary {
            tenant_id: self.tenant_id.clone(),
            scored,
            skipped,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    /// Batch rollup over the current scores of every open lead
    pub async fn insights(&self) -> Result<TenantInsights> {
        let results = self.score_all_leads().await?;
        let aggregator = InsightsAggregator::from_config(&self.config);
        Ok(aggregator.aggregate(&self.tenant_id, &results, self.clock.now()))
    }
}
