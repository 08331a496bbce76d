//! Scoring sessions over the in-memory stores

use chrono::{Duration, Utc};
use std::sync::Arc;

use leadflow_config::ScoringConfig;
use leadflow_core::{
    ActivityType, Clock, Lead, LeadActivity, LeadStatus, ManualClock, ScoreTier,
};
use leadflow_persistence::{ActivityStore, InMemoryActivityStore, InMemoryLeadStore, LeadStore};
use leadflow_scoring::ScoringEngine;

struct Harness {
    leads: Arc<InMemoryLeadStore>,
    activities: Arc<InMemoryActivityStore>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        Self {
            leads: Arc::new(InMemoryLeadStore::new()),
            activities: Arc::new(InMemoryActivityStore::new()),
            clock: Arc::new(ManualClock::new(Utc::now())),
        }
    }

    async fn engine(&self, tenant_id: &str) -> ScoringEngine {
        ScoringEngine::for_tenant(
            tenant_id,
            self.leads.clone(),
            self.activities.clone(),
            self.clock.clone(),
            ScoringConfig::default(),
        )
        .await
        .unwrap()
    }

    /// A lead opened `age_days` ago, moved to `status` now
    async fn lead(
        &self,
        tenant_id: &str,
        status: LeadStatus,
        source: &str,
        value: f64,
        age_days: i64,
    ) -> Lead {
        let now = self.clock.now();
        let mut lead = Lead::new(tenant_id, "buyer@acme.com", now - Duration::days(age_days));
        lead.name = "Pat Buyer".to_string();
        lead.source = source.to_string();
        lead.deal_value = Some(value);
        lead.set_status(status, now);
        self.leads.insert(&lead).await.unwrap();
        lead
    }

    async fn activity(&self, lead: &Lead, kind: ActivityType, days_ago: i64) {
        let at = self.clock.now() - Duration::days(days_ago);
        self.activities
            .record(&LeadActivity::new(&lead.tenant_id, lead.id, kind, at))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_benchmarks_come_from_tenant_history() {
    let h = Harness::new();
    for age in [10, 20, 30] {
        let won = h.lead("t1", LeadStatus::Won, "Referral", 100_000.0, age).await;
        h.activity(&won, ActivityType::Call, age).await;
        h.activity(&won, ActivityType::Meeting, age - 1).await;
    }
    h.lead("t1", LeadStatus::Lost, "Cold Call", 5_000.0, 40).await;
    // another tenant's history must not leak in
    h.lead("t2", LeadStatus::Won, "Cold Call", 1_000_000.0, 5).await;

    let engine = h.engine("t1").await;
    let benchmarks = engine.benchmarks();
    assert!((benchmarks.avg_deal_value - 100_000.0).abs() < 1e-6);
    assert!((benchmarks.avg_activities - 2.0).abs() < 1e-6);
    assert!((benchmarks.avg_days_to_close - 25.0).abs() < 0.01);
    assert_eq!(benchmarks.source_win_rate("referral"), Some(1.0));
    assert_eq!(benchmarks.source_win_rate("cold call"), Some(0.0));
}

#[tokio::test]
async fn test_engaged_referral_outscores_cold_lead() {
    let h = Harness::new();
    for age in [10, 20, 30] {
        h.lead("t1", LeadStatus::Won, "Referral", 50_000.0, age).await;
    }
    h.lead("t1", LeadStatus::Lost, "Cold Call", 5_000.0, 40).await;

    let warm = h.lead("t1", LeadStatus::Proposal, "Referral", 120_000.0, 3).await;
    h.activity(&warm, ActivityType::Meeting, 1).await;
    h.activity(&warm, ActivityType::Call, 2).await;
    let cold = h.lead("t1", LeadStatus::New, "Cold Call", 1_000.0, 2).await;

    let engine = h.engine("t1").await;
    let warm_result = engine.score_lead(&warm).await.unwrap();
    let cold_result = engine.score_lead(&cold).await.unwrap();

    assert!(warm_result.total_score > cold_result.total_score);
    assert_eq!(warm_result.breakdown.source, 20);
    assert_eq!(warm_result.breakdown.value, 20);
    assert_eq!(cold_result.breakdown.source, 5);
    assert!(warm_result.predicted_close_days.is_some());
    assert!(!cold_result.risk_factors.is_empty());
    assert_eq!(cold_result.next_action, "Call within 24 hours to qualify");
}

#[tokio::test]
async fn test_score_all_leads_is_sorted_and_tenant_scoped() {
    let h = Harness::new();
    h.lead("t1", LeadStatus::New, "", 0.0, 1).await;
    h.lead("t1", LeadStatus::Negotiation, "Referral", 80_000.0, 5).await;
    h.lead("t1", LeadStatus::Qualified, "Web", 20_000.0, 5).await;
    h.lead("t2", LeadStatus::Qualified, "Web", 20_000.0, 5).await;

    let results = h.engine("t1").await.score_all_leads().await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.windows(2).all(|w| w[0].total_score >= w[1].total_score));
    for result in &results {
        assert!(result.breakdown.within_bounds());
        assert!(result.total_score <= 100);
    }
}

#[tokio::test]
async fn test_refresh_persists_every_lead() {
    let h = Harness::new();
    let won = h.lead("t1", LeadStatus::Won, "Referral", 10_000.0, 10).await;
    let lost = h.lead("t1", LeadStatus::Lost, "Referral", 10_000.0, 10).await;
    let open = h.lead("t1", LeadStatus::Contacted, "Referral", 10_000.0, 2).await;

    let summary = h.engine("t1").await.refresh_scores().await.unwrap();
    assert_eq!(summary.scored, 3);
    assert_eq!(summary.tenant_id, "t1");

    let won = h.leads.get("t1", won.id).await.unwrap().unwrap();
    let lost = h.leads.get("t1", lost.id).await.unwrap().unwrap();
    let open = h.leads.get("t1", open.id).await.unwrap().unwrap();
    assert_eq!(won.win_probability, 100);
    assert_eq!(lost.win_probability, 0);
    assert!((5..=95).contains(&open.win_probability));
    assert_eq!(open.score, open.sub_scores.total());
    assert_eq!(open.score_updated_at, Some(h.clock.now()));
}

#[tokio::test]
async fn test_insights_cover_open_leads_only() {
    let h = Harness::new();
    h.lead("t1", LeadStatus::Won, "Referral", 10_000.0, 10).await;
    let hot = h.lead("t1", LeadStatus::Negotiation, "Referral", 200_000.0, 4).await;
    for days in [0, 1, 2] {
        h.activity(&hot, ActivityType::Meeting, days).await;
    }
    h.lead("t1", LeadStatus::New, "", 0.0, 90).await;

    let insights = h.engine("t1").await.insights().await.unwrap();
    assert_eq!(insights.open_leads, 2);
    assert_eq!(insights.status_counts.get("won"), Some(&1));
    assert_eq!(insights.hot_leads.first().map(|l| l.lead_id), Some(hot.id));
    assert_eq!(insights.hot_leads[0].tier, ScoreTier::Hot);
    assert_eq!(insights.at_risk_count, 1);
    assert!((insights.pipeline_value - 200_000.0).abs() < 1e-6);
}
