//! In-memory stores
//!
//! The default backend when ScyllaDB is disabled, and the backend used by
//! tests. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use leadflow_core::{Lead, LeadActivity, LeadChanges, ScoreSnapshot};

use crate::store::{ActivityStore, LeadStore};
use crate::PersistenceError;

/// Leads grouped by tenant
#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<HashMap<String, HashMap<Uuid, Lead>>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total leads across tenants
    pub fn len(&self) -> usize {
        self.leads.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, tenant_id: &str, email: &str, since: DateTime<Utc>) -> Vec<Lead> {
        let leads = self.leads.read();
        let mut found: Vec<Lead> = leads
            .get(tenant_id)
            .map(|by_id| {
                by_id
                    .values()
                    .filter(|l| l.email == email && l.created_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn find_recent(
        &self,
        tenant_id: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Lead>, PersistenceError> {
        Ok(self.matching(tenant_id, email, since))
    }

    async fn count_recent(
        &self,
        tenant_id: &str,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<usize, PersistenceError> {
        let leads = self.leads.read();
        Ok(leads
            .get(tenant_id)
            .map(|by_id| {
                by_id
                    .values()
                    .filter(|l| l.email == email && l.created_at >= since)
                    .count()
            })
            .unwrap_or(0))
    }

    async fn insert(&self, lead: &Lead) -> Result<(), PersistenceError> {
        self.leads
            .write()
            .entry(lead.tenant_id.clone())
            .or_default()
            .insert(lead.id, lead.clone());
        Ok(())
    }

    async fn get(&self, tenant_id: &str, lead_id: Uuid) -> Result<Option<Lead>, PersistenceError> {
        Ok(self
            .leads
            .read()
            .get(tenant_id)
            .and_then(|by_id| by_id.get(&lead_id))
            .cloned())
    }

    async fn update_fields(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        changes: &LeadChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Lead>, PersistenceError> {
        let mut leads = self.leads.write();
        let Some(lead) = leads.get_mut(tenant_id).and_then(|by_id| by_id.get_mut(&lead_id)) else {
            return Ok(None);
        };
        changes.apply(lead, now);
        Ok(Some(lead.clone()))
    }

    async fn update_scores(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        snapshot: &ScoreSnapshot,
    ) -> Result<(), PersistenceError> {
        let mut leads = self.leads.write();
        let lead = leads
            .get_mut(tenant_id)
            .and_then(|by_id| by_id.get_mut(&lead_id))
            .ok_or_else(|| PersistenceError::NotFound(format!("lead {}", lead_id)))?;
        lead.apply_scores(snapshot);
        Ok(())
    }

    async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<Lead>, PersistenceError> {
        let mut leads: Vec<Lead> = self
            .leads
            .read()
            .get(tenant_id)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default();
        leads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(leads)
    }
}

/// Activities keyed by `(tenant, lead)`
#[derive(Default)]
pub struct InMemoryActivityStore {
    activities: RwLock<HashMap<(String, Uuid), Vec<LeadActivity>>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn record(&self, activity: &LeadActivity) -> Result<(), PersistenceError> {
        self.activities
            .write()
            .entry((activity.tenant_id.clone(), activity.lead_id))
            .or_default()
            .push(activity.clone());
        Ok(())
    }

    async fn list_for_lead(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LeadActivity>, PersistenceError> {
        let mut found: Vec<LeadActivity> = self
            .activities
            .read()
            .get(&(tenant_id.to_string(), lead_id))
            .map(|list| {
                list.iter()
                    .filter(|a| since.map_or(true, |s| a.occurred_at >= s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(found)
    }

    async fn count_for_lead(
        &self,
        tenant_id: &str,
        lead_id: Uuid,
    ) -> Result<usize, PersistenceError> {
        Ok(self
            .activities
            .read()
            .get(&(tenant_id.to_string(), lead_id))
            .map(Vec::len)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use leadflow_core::{ActivityType, ScoreBreakdown};

    #[tokio::test]
    async fn test_find_recent_is_tenant_scoped_and_newest_first() {
        let store = InMemoryLeadStore::new();
        let now = Utc::now();

        let old = Lead::new("t1", "a@b.com", now - Duration::hours(30));
        let mid = Lead::new("t1", "a@b.com", now - Duration::hours(2));
        let new = Lead::new("t1", "a@b.com", now - Duration::minutes(5));
        let other_tenant = Lead::new("t2", "a@b.com", now);
        for lead in [&old, &mid, &new, &other_tenant] {
            store.insert(lead).await.unwrap();
        }

        let found = store
            .find_recent("t1", "a@b.com", now - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(found.iter().map(|l| l.id).collect::<Vec<_>>(), vec![new.id, mid.id]);

        let count = store
            .count_recent("t1", "a@b.com", now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn test_update_fields_and_scores() {
        let store = InMemoryLeadStore::new();
        let now = Utc::now();
        let lead = Lead::new("t1", "a@b.com", now);
        store.insert(&lead).await.unwrap();

        let changes = LeadChanges {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        let later = now + Duration::minutes(1);
        let updated = store
            .update_fields("t1", lead.id, &changes, later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.phone, "555-0100");
        assert_eq!(updated.updated_at, later);

        // wrong tenant sees nothing
        assert!(store
            .update_fields("t2", lead.id, &changes, later)
            .await
            .unwrap()
            .is_none());

        let snapshot = ScoreSnapshot {
            sub_scores: ScoreBreakdown {
                engagement: 10,
                source: 5,
                value: 8,
                velocity: 0,
                fit: 7,
            },
            score: 30,
            win_probability: 7,
            scored_at: later,
        };
        store.update_scores("t1", lead.id, &snapshot).await.unwrap();
        let stored = store.get("t1", lead.id).await.unwrap().unwrap();
        assert_eq!(stored.score, 30);
        assert_eq!(stored.score_updated_at, Some(later));

        let missing = store.update_scores("t1", Uuid::new_v4(), &snapshot).await;
        assert!(matches!(missing, Err(PersistenceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_activities_newest_first() {
        let store = InMemoryActivityStore::new();
        let now = Utc::now();
        let lead_id = Uuid::new_v4();

        for (days, kind) in [(10, ActivityType::Email), (1, ActivityType::Call), (4, ActivityType::Meeting)] {
            store
                .record(&LeadActivity::new("t1", lead_id, kind, now - Duration::days(days)))
                .await
                .unwrap();
        }

        let all = store.list_for_lead("t1", lead_id, None).await.unwrap();
        let kinds: Vec<_> = all.iter().map(|a| a.activity_type).collect();
        assert_eq!(kinds, vec![ActivityType::Call, ActivityType::Meeting, ActivityType::Email]);

        let recent = store
            .list_for_lead("t1", lead_id, Some(now - Duration::days(5)))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(store.count_for_lead("t1", lead_id).await.unwrap(), 3);
        assert_eq!(store.count_for_lead("t2", lead_id).await.unwrap(), 0);
    }
}
