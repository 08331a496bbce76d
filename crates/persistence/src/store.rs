//! Record-store interfaces consumed by intake and scoring
//!
//! Every call is tenant-scoped; no method reads or writes across tenants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use leadflow_core::{Lead, LeadActivity, LeadChanges, ScoreSnapshot};

use crate::PersistenceError;

/// Lead records keyed by tenant
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Leads for `(tenant_id, email)` created at or after `since`, newest first
    async fn find_recent(
        &self,
        tenant_id: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Lead>, PersistenceError>;

    /// Number of leads for `(tenant_id, email)` created at or after `since`
    async fn count_recent(
        &self,
        tenant_id: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<usize, PersistenceError>;

    async fn insert(&self, lead: &Lead) -> Result<(), PersistenceError>;

    async fn get(&self, tenant_id: &str, lead_id: Uuid) -> Result<Option<Lead>, PersistenceError>;

    /// Apply a merge change set; returns the updated lead, or `None` if it does not exist
    async fn update_fields(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        changes: &LeadChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Lead>, PersistenceError>;

    /// Persist sub-scores, aggregate, win probability and `score_updated_at`
    async fn update_scores(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        snapshot: &ScoreSnapshot,
    ) -> Result<(), PersistenceError>;

    /// Every lead of the tenant, oldest first
    async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<Lead>, PersistenceError>;
}

/// Read side over lead activities (written by external collaborators)
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record(&self, activity: &LeadActivity) -> Result<(), PersistenceError>;

    /// Activities of one lead, newest first, optionally bounded below by `since`
    async fn list_for_lead(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LeadActivity>, PersistenceError>;

    async fn count_for_lead(&self, tenant_id: &str, lead_id: Uuid)
        -> Result<usize, PersistenceError>;
}
