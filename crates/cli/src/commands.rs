//! Subcommand implementations

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use leadflow_config::Settings;
use leadflow_core::{mask_email, Clock, LeadSubmission, SystemClock};
use leadflow_intake::{IntakeOrchestrator, IntakeOutcome};
use leadflow_persistence::{
    ActivityStore, InMemoryActivityStore, InMemoryLeadStore, LeadStore, ScyllaConfig,
};
use leadflow_scoring::{RefreshSummary, ScoringEngine};
use leadflow_text_processing::sanitize_email;

use crate::input::{read_jsonl, ActivityRecord};

/// Store handles shared by every command
pub struct Stores {
    pub leads: Arc<dyn LeadStore>,
    pub activities: Arc<dyn ActivityStore>,
    /// False when running on in-memory stores
    pub durable: bool,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            leads: Arc::new(InMemoryLeadStore::new()),
            activities: Arc::new(InMemoryActivityStore::new()),
            durable: false,
        }
    }

    /// ScyllaDB when persistence is enabled, in-memory otherwise or on failure
    pub async fn open(settings: &Settings) -> Self {
        if !settings.persistence.enabled {
            tracing::info!("Persistence disabled, using in-memory stores");
            return Self::in_memory();
        }

        tracing::info!("Initializing ScyllaDB persistence layer...");
        match leadflow_persistence::init(ScyllaConfig::from(&settings.persistence)).await {
            Ok(layer) => {
                tracing::info!(
                    hosts = ?settings.persistence.scylla_hosts,
                    keyspace = %settings.persistence.keyspace,
                    "ScyllaDB persistence initialized"
                );
                Self {
                    leads: Arc::new(layer.leads),
                    activities: Arc::new(layer.activities),
                    durable: true,
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to initialize ScyllaDB. Falling back to in-memory."
                );
                Self::in_memory()
            }
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub tenant_id: String,
    pub processed: usize,
    pub created: usize,
    pub merged: usize,
    /// Rejections keyed by reason
    pub rejected: BTreeMap<&'static str, usize>,
    pub activities_recorded: usize,
    /// Activity rows whose email matched no lead of the tenant
    pub activities_unmatched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshSummary>,
}

pub async fn ingest(
    settings: &Settings,
    stores: &Stores,
    tenant_id: &str,
    leads_file: &Path,
    activities_file: Option<&Path>,
    refresh: bool,
) -> Result<IngestReport> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let submissions: Vec<LeadSubmission> = read_jsonl(leads_file)?;
    let intake = IntakeOrchestrator::new(
        stores.leads.clone(),
        settings.intake.clone(),
        settings.spam.clone(),
        clock.clone(),
    );

    let mut report = IngestReport {
        tenant_id: tenant_id.to_string(),
        ..Default::default()
    };
    for submission in &submissions {
        let outcome = intake
            .submit(tenant_id, submission)
            .await
            .context("intake failed")?;
        report.processed += 1;
        match outcome {
            IntakeOutcome::Created { .. } => report.created += 1,
            IntakeOutcome::Merged { .. } => report.merged += 1,
            IntakeOutcome::Rejected { rejection, .. } => {
                *report.rejected.entry(rejection.as_str()).or_insert(0) += 1;
            }
        }
    }

    if let Some(path) = activities_file {
        let records: Vec<ActivityRecord> = read_jsonl(path)?;
        for record in records {
            let email = sanitize_email(&record.email);
            let lead = stores
                .leads
                .find_recent(tenant_id, &email, DateTime::<Utc>::MIN_UTC)
                .await?
                .into_iter()
                .next();
            match lead {
                Some(lead) => {
                    stores
                        .activities
                        .record(&record.into_activity(tenant_id, lead.id))
                        .await?;
                    report.activities_recorded += 1;
                }
                None => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        email = %mask_email(&record.email),
                        "Activity does not match any lead"
                    );
                    report.activities_unmatched += 1;
                }
            }
        }
    }

    tracing::info!(
        tenant_id = %tenant_id,
        processed = report.processed,
        created = report.created,
        merged = report.merged,
        "Ingest complete"
    );

    if refresh {
        let engine = engine(settings, stores, tenant_id, clock).await?;
        report.refresh = Some(engine.refresh_scores().await?);
    }
    Ok(report)
}

pub async fn score(
    settings: &Settings,
    stores: &Stores,
    tenant_id: &str,
    lead_id: Option<Uuid>,
) -> Result<serde_json::Value> {
    warn_if_ephemeral(stores);
    let engine = engine(settings, stores, tenant_id, Arc::new(SystemClock)).await?;

    let value = match lead_id {
        Some(id) => {
            let lead = stores
                .leads
                .get(tenant_id, id)
                .await?
                .with_context(|| format!("lead {} not found for tenant {}", id, tenant_id))?;
            serde_json::to_value(engine.score_lead(&lead).await?)?
        }
        None => serde_json::to_value(engine.score_all_leads().await?)?,
    };
    Ok(value)
}

pub async fn insights(
    settings: &Settings,
    stores: &Stores,
    tenant_id: &str,
) -> Result<serde_json::Value> {
    warn_if_ephemeral(stores);
    let engine = engine(settings, stores, tenant_id, Arc::new(SystemClock)).await?;
    Ok(serde_json::to_value(engine.insights().await?)?)
}

async fn engine(
    settings: &Settings,
    stores: &Stores,
    tenant_id: &str,
    clock: Arc<dyn Clock>,
) -> Result<ScoringEngine> {
    Ok(ScoringEngine::for_tenant(
        tenant_id,
        stores.leads.clone(),
        stores.activities.clone(),
        clock,
        settings.scoring.clone(),
    )
    .await?)
}

fn warn_if_ephemeral(stores: &Stores) {
    if !stores.durable {
        tracing::warn!("In-memory stores start empty; enable persistence to score stored leads");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_ingest_with_activities_and_refresh() {
        let mut leads = tempfile::NamedTempFile::new().unwrap();
        writeln!(leads, r#"{{"email": "ann@acme.com", "name": "Ann", "source": "Referral"}}"#).unwrap();
        writeln!(leads, r#"{{"email": "ANN@acme.com ", "phone": "555-0100"}}"#).unwrap();
        writeln!(leads, r#"{{"email": "not-an-email"}}"#).unwrap();
        writeln!(leads, r#"{{"email": "bob@mailinator.com", "name": "Bob"}}"#).unwrap();

        let mut acts = tempfile::NamedTempFile::new().unwrap();
        let at = Utc::now().to_rfc3339();
        writeln!(acts, r#"{{"email": "ann@acme.com", "type": "call", "occurred_at": "{}"}}"#, at).unwrap();
        writeln!(acts, r#"{{"email": "zed@acme.com", "type": "email", "occurred_at": "{}"}}"#, at).unwrap();

        let settings = Settings::default();
        let stores = Stores::in_memory();
        let report = ingest(
            &settings,
            &stores,
            "t1",
            leads.path(),
            Some(acts.path()),
            true,
        )
        .await
        .unwrap();

        assert_eq!(report.processed, 4);
        assert_eq!(report.created, 1);
        assert_eq!(report.merged, 1);
        assert_eq!(report.rejected.values().sum::<usize>(), 2);
        assert_eq!(report.activities_recorded, 1);
        assert_eq!(report.activities_unmatched, 1);
        assert_eq!(report.refresh.map(|r| r.scored), Some(1));

        let stored = stores.leads.list_for_tenant("t1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].phone, "555-0100");
        assert!(stored[0].score_updated_at.is_some());
    }

    #[tokio::test]
    async fn test_score_unknown_lead_fails() {
        let stores = Stores::in_memory();
        let result = score(&Settings::default(), &stores, "t1", Some(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
