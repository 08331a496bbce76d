//! Lead activity persistence using ScyllaDB

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use leadflow_core::LeadActivity;

use crate::store::ActivityStore;
use crate::{PersistenceError, ScyllaClient};

#[derive(Clone)]
pub struct ScyllaActivityStore {
    client: ScyllaClient,
}

impl ScyllaActivityStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActivityStore for ScyllaActivityStore {
    async fn record(&self, activity: &LeadActivity) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.lead_activities (
                tenant_id, lead_id, occurred_at, activity_id, activity_type, payload
            ) VALUES (?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &activity.tenant_id,
                    activity.lead_id,
                    activity.occurred_at.timestamp_millis(),
                    activity.id,
                    activity.activity_type.as_str(),
                    serde_json::to_string(activity)?,
                ),
            )
            .await?;

        tracing::debug!(
            tenant_id = %activity.tenant_id,
            lead_id = %activity.lead_id,
            activity_type = activity.activity_type.as_str(),
            "Activity recorded"
        );

        Ok(())
    }

    async fn list_for_lead(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LeadActivity>, PersistenceError> {
        let keyspace = self.client.keyspace();
        let result = match since {
            Some(since) => {
                let query = format!(
                    "SELECT payload FROM {}.lead_activities
                     WHERE tenant_id = ? AND lead_id = ? AND occurred_at >= ?",
                    keyspace
                );
                self.client
                    .session()
                    .query_unpaged(query, (tenant_id, lead_id, since.timestamp_millis()))
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT payload FROM {}.lead_activities WHERE tenant_id = ? AND lead_id = ?",
                    keyspace
                );
                self.client
                    .session()
                    .query_unpaged(query, (tenant_id, lead_id))
                    .await?
            }
        };

        let mut activities = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let (payload,): (String,) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                activities.push(serde_json::from_str::<LeadActivity>(&payload)?);
            }
        }
        activities.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

        Ok(activities)
    }

    async fn count_for_lead(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
    ) -> Result<usize, PersistenceError> {
        let query = format!(
            "SELECT COUNT(*) FROM {}.lead_activities WHERE tenant_id = ? AND lead_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (tenant_id, lead_id))
            .await?;

        if let Some(row) = result.rows.and_then(|rows| rows.into_iter().next()) {
            let (count,): (i64,) = row
                .into_typed()
                .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
            return Ok(count.max(0) as usize);
        }
        Ok(0)
    }
}
