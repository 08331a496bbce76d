//! Lead record and lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::score::{ScoreBreakdown, ScoreSnapshot};
use crate::submission::SanitizedLead;

/// Pipeline stage of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 7] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Proposal,
        LeadStatus::Negotiation,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "new" => Self::New,
            "contacted" => Self::Contacted,
            "qualified" => Self::Qualified,
            "proposal" => Self::Proposal,
            "negotiation" => Self::Negotiation,
            "won" => Self::Won,
            "lost" => Self::Lost,
            _ => Self::New,
        }
    }

    /// Won or lost; predictive outputs are fixed once a lead gets here
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Late pipeline stages where closing speed matters most
    pub fn is_late_stage(&self) -> bool {
        matches!(self, Self::Proposal | Self::Negotiation)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Referral / campaign attribution captured with the submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default)]
    pub referrer: String,
    #[serde(default)]
    pub utm_source: String,
    #[serde(default)]
    pub utm_medium: String,
    #[serde(default)]
    pub utm_campaign: String,
}

/// A tenant-scoped contact record
///
/// Text fields use the empty string for "absent", matching what the sanitizer
/// produces for unusable input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub tenant_id: String,

    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,

    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub attribution: Attribution,

    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,

    /// Persisted sub-scores from the last scoring refresh
    #[serde(default)]
    pub sub_scores: ScoreBreakdown,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub win_probability: u8,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_updated_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Create a new lead with the given tenant and email at `now`
    pub fn new(tenant_id: &str, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            email: email.to_string(),
            phone: String::new(),
            name: String::new(),
            company: String::new(),
            source: String::new(),
            attribution: Attribution::default(),
            status: LeadStatus::New,
            notes: String::new(),
            deal_value: None,
            sub_scores: ScoreBreakdown::default(),
            score: 0,
            win_probability: 0,
            created_at: now,
            updated_at: now,
            closed_at: None,
            score_updated_at: None,
        }
    }

    /// Build the record stored for an accepted, non-duplicate submission
    pub fn from_sanitized(data: &SanitizedLead, now: DateTime<Utc>) -> Self {
        let mut lead = Self::new(&data.tenant_id, &data.email, now);
        lead.phone = data.phone.clone();
        lead.name = data.name.clone();
        lead.company = data.company.clone();
        lead.source = data.source.clone();
        lead.attribution = data.attribution.clone();
        lead.notes = data.notes.clone();
        lead.deal_value = data.deal_value;
        lead
    }

    /// Move the lead to `status`, keeping `closed_at` in step with terminal stages
    pub fn set_status(&mut self, status: LeadStatus, now: DateTime<Utc>) {
        if status.is_terminal() {
            if !self.status.is_terminal() || self.closed_at.is_none() {
                self.closed_at = Some(now);
            }
        } else {
            self.closed_at = None;
        }
        self.status = status;
        self.updated_at = now;
    }

    /// Copy a scoring snapshot into the persisted score fields
    pub fn apply_scores(&mut self, snapshot: &ScoreSnapshot) {
        self.sub_scores = snapshot.sub_scores;
        self.score = snapshot.score.min(100);
        self.win_probability = snapshot.win_probability.min(100);
        self.score_updated_at = Some(snapshot.scored_at);
    }

    /// Whole days the lead has been (or was) open
    pub fn days_open(&self, now: DateTime<Utc>) -> f64 {
        let end = self.closed_at.unwrap_or(now);
        let secs = (end - self.created_at).num_seconds().max(0);
        secs as f64 / 86_400.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_conversion() {
        for status in LeadStatus::ALL {
            assert_eq!(LeadStatus::from_str(status.as_str()), status);
        }
        assert_eq!(LeadStatus::from_str("bogus"), LeadStatus::New);
    }

    #[test]
    fn test_set_status_maintains_closed_at() {
        let now = Utc::now();
        let mut lead = Lead::new("t1", "a@b.com", now);
        assert!(lead.closed_at.is_none());

        lead.set_status(LeadStatus::Won, now + Duration::days(3));
        assert_eq!(lead.closed_at, Some(now + Duration::days(3)));

        lead.set_status(LeadStatus::Negotiation, now + Duration::days(4));
        assert!(lead.closed_at.is_none());

        lead.set_status(LeadStatus::Lost, now + Duration::days(5));
        assert!(lead.closed_at.is_some());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&LeadStatus::Negotiation).unwrap();
        assert_eq!(json, "\"negotiation\"");
    }

    #[test]
    fn test_days_open_uses_closed_at() {
        let now = Utc::now();
        let mut lead = Lead::new("t1", "a@b.com", now - Duration::days(20));
        lead.set_status(LeadStatus::Won, now - Duration::days(10));
        assert!((lead.days_open(now) - 10.0).abs() < 0.01);
    }
}
