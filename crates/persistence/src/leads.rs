//! Lead persistence using ScyllaDB

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::frame::response::result::Row;
use uuid::Uuid;

use leadflow_core::{mask_email, Lead, LeadChanges, ScoreSnapshot};

use crate::store::LeadStore;
use crate::{PersistenceError, ScyllaClient};

/// ScyllaDB implementation of the lead store
#[derive(Clone)]
pub struct ScyllaLeadStore {
    client: ScyllaClient,
}

impl ScyllaLeadStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    /// Overwrite the tenant row for `lead`
    async fn write_record(&self, lead: &Lead) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.leads_by_tenant (
                tenant_id, lead_id, email, status, score, created_at, updated_at, payload
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        let payload = serde_json::to_string(lead)?;
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &lead.tenant_id,
                    lead.id,
                    &lead.email,
                    lead.status.as_str(),
                    lead.score as i32,
                    lead.created_at.timestamp_millis(),
                    lead.updated_at.timestamp_millis(),
                    payload,
                ),
            )
            .await?;

        Ok(())
    }

    async fn recent_ids(
        &self,
        tenant_id: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, PersistenceError> {
        let query = format!(
            "SELECT lead_id FROM {}.leads_by_identity
             WHERE tenant_id = ? AND email = ? AND created_at >= ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (tenant_id, email, since.timestamp_millis()))
            .await?;

        let mut ids = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let (lead_id,): (Uuid,) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                ids.push(lead_id);
            }
        }
        Ok(ids)
    }

    fn row_to_lead(row: Row) -> Result<Lead, PersistenceError> {
        let (payload,): (String,) = row
            .into_typed()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
        Ok(serde_json::from_str(&payload)?)
    }
}

#[async_trait]
impl LeadStore for ScyllaLeadStore {
    async fn find_recent(
        &self,
        tenant_id: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Lead>, PersistenceError> {
        let mut leads = Vec::new();
        for lead_id in self.recent_ids(tenant_id, email, since).await? {
            match self.get(tenant_id, lead_id).await? {
                Some(lead) => leads.push(lead),
                None => tracing::warn!(
                    tenant_id = %tenant_id,
                    lead_id = %lead_id,
                    "Identity index points at a missing lead"
                ),
            }
        }
        // clustering order already gives newest first; keep it explicit
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn count_recent(
        &self,
        tenant_id: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<usize, PersistenceError> {
        let query = format!(
            "SELECT COUNT(*) FROM {}.leads_by_identity
             WHERE tenant_id = ? AND email = ? AND created_at >= ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (tenant_id, email, since.timestamp_millis()))
            .await?;

        if let Some(row) = result.rows.and_then(|rows| rows.into_iter().next()) {
            let (count,): (i64,) = row
                .into_typed()
                .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
            return Ok(count.max(0) as usize);
        }
        Ok(0)
    }

    async fn insert(&self, lead: &Lead) -> Result<(), PersistenceError> {
        self.write_record(lead).await?;

        let query = format!(
            "INSERT INTO {}.leads_by_identity (tenant_id, email, created_at, lead_id)
             VALUES (?, ?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &lead.tenant_id,
                    &lead.email,
                    lead.created_at.timestamp_millis(),
                    lead.id,
                ),
            )
            .await?;

        tracing::info!(
            tenant_id = %lead.tenant_id,
            lead_id = %lead.id,
            email = %mask_email(&lead.email),
            "Lead stored in ScyllaDB"
        );

        Ok(())
    }

    async fn get(&self, tenant_id: &str, lead_id: Uuid) -> Result<Option<Lead>, PersistenceError> {
        let query = format!(
            "SELECT payload FROM {}.leads_by_tenant WHERE tenant_id = ? AND lead_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (tenant_id, lead_id))
            .await?;

        match result.rows.and_then(|rows| rows.into_iter().next()) {
            Some(row) => Ok(Some(Self::row_to_lead(row)?)),
            None => Ok(None),
        }
    }

    async fn update_fields(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        changes: &LeadChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Lead>, PersistenceError> {
        let Some(mut lead) = self.get(tenant_id, lead_id).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(lead));
        }

        changes.apply(&mut lead, now);
        self.write_record(&lead).await?;

        tracing::info!(
            tenant_id = %tenant_id,
            lead_id = %lead_id,
            fields = ?changes.changed_fields(),
            "Lead fields updated"
        );

        Ok(Some(lead))
    }

    async fn update_scores(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        snapshot: &ScoreSnapshot,
    ) -> Result<(), PersistenceError> {
        let mut lead = self
            .get(tenant_id, lead_id)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(format!("lead {}", lead_id)))?;

        lead.apply_scores(snapshot);
        self.write_record(&lead).await
    }

    async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<Lead>, PersistenceError> {
        let query = format!(
            "SELECT payload FROM {}.leads_by_tenant WHERE tenant_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (tenant_id,))
            .await?;

        let mut leads = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                leads.push(Self::row_to_lead(row)?);
            }
        }
        leads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(leads)
    }
}
