//! Lead activity events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of touchpoint logged against a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Note,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Meeting => "meeting",
            Self::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "call" => Self::Call,
            "email" => Self::Email,
            "meeting" => Self::Meeting,
            _ => Self::Note,
        }
    }
}

/// Immutable event attached to a lead by CRM sync or manual logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadActivity {
    pub id: Uuid,
    pub tenant_id: String,
    pub lead_id: Uuid,
    pub activity_type: ActivityType,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl LeadActivity {
    pub fn new(
        tenant_id: &str,
        lead_id: Uuid,
        activity_type: ActivityType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            lead_id,
            activity_type,
            occurred_at,
            outcome: None,
            duration_minutes: None,
        }
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }
}
