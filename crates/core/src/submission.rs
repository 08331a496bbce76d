//! Raw and sanitized submission payloads, and the merge change set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lead::{Attribution, Lead};

/// Untrusted submission exactly as received from a public form
///
/// Every field is optional; nothing here is trusted, including anything that
/// looks like a tenant identifier (the tenant is always supplied by the caller).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub deal_value: Option<f64>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
}

/// Submission after field-level cleaning, bound to a tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanitizedLead {
    pub tenant_id: String,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub company: String,
    pub source: String,
    pub notes: String,
    pub deal_value: Option<f64>,
    pub attribution: Attribution,
}

impl SanitizedLead {
    /// Text fields checked by content heuristics, with their names
    pub fn text_fields(&self) -> [(&'static str, &str); 10] {
        [
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("name", self.name.as_str()),
            ("company", self.company.as_str()),
            ("notes", self.notes.as_str()),
            ("source", self.source.as_str()),
            ("referrer", self.attribution.referrer.as_str()),
            ("utm_source", self.attribution.utm_source.as_str()),
            ("utm_medium", self.attribution.utm_medium.as_str()),
            ("utm_campaign", self.attribution.utm_campaign.as_str()),
        ]
    }
}

/// Field set to write onto an existing lead; `None` means "leave unchanged"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LeadChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the fields this change set touches
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let text = [
            ("phone", &self.phone),
            ("name", &self.name),
            ("company", &self.company),
            ("source", &self.source),
            ("referrer", &self.referrer),
            ("utm_source", &self.utm_source),
            ("utm_medium", &self.utm_medium),
            ("utm_campaign", &self.utm_campaign),
        ];
        for (name, value) in text {
            if value.is_some() {
                fields.push(name);
            }
        }
        if self.deal_value.is_some() {
            fields.push("deal_value");
        }
        if self.notes.is_some() {
            fields.push("notes");
        }
        fields
    }

    /// Write the change set onto `lead`, bumping `updated_at` when anything changed
    pub fn apply(&self, lead: &mut Lead, now: DateTime<Utc>) {
        if self.is_empty() {
            return;
        }
        if let Some(ref v) = self.phone {
            lead.phone = v.clone();
        }
        if let Some(ref v) = self.name {
            lead.name = v.clone();
        }
        if let Some(ref v) = self.company {
            lead.company = v.clone();
        }
        if let Some(ref v) = self.source {
            lead.source = v.clone();
        }
        if let Some(ref v) = self.referrer {
            lead.attribution.referrer = v.clone();
        }
        if let Some(ref v) = self.utm_source {
            lead.attribution.utm_source = v.clone();
        }
        if let Some(ref v) = self.utm_medium {
            lead.attribution.utm_medium = v.clone();
        }
        if let Some(ref v) = self.utm_campaign {
            lead.attribution.utm_campaign = v.clone();
        }
        if let Some(v) = self.deal_value {
            lead.deal_value = Some(v);
        }
        if let Some(ref v) = self.notes {
            lead.notes = v.clone();
        }
        lead.updated_at = now;
    }
}
