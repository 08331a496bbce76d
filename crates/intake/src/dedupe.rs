//! Time-windowed duplicate lookup and field merge
//!
//! A repeat submission never overwrites data the tenant already has. A field
//! is filled in only when the stored value is empty or a placeholder and the
//! incoming value is real.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use leadflow_core::{Clock, Lead, LeadChanges, SanitizedLead};
use leadflow_persistence::LeadStore;
use leadflow_text_processing::is_placeholder;

use crate::error::{window, Result};

static AUTO_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[auto-generated\].*?\[/auto-generated\]").unwrap());

/// A text field eligible for merge
struct MergeField {
    name: &'static str,
    existing: fn(&Lead) -> &str,
    incoming: fn(&SanitizedLead) -> &str,
    assign: fn(&mut LeadChanges, String),
    /// Whether a value counts as missing for this field
    placeholder: fn(&str) -> bool,
}

/// Phone numbers are digits and punctuation, which the text placeholder
/// heuristics would reject, so only an empty phone is missing
fn phone_missing(value: &str) -> bool {
    value.trim().is_empty()
}

/// Merge-eligible text fields, in the order they are reported
const MERGE_FIELDS: &[MergeField] = &[
    MergeField {
        name: "phone",
        existing: |l| &l.phone,
        incoming: |s| &s.phone,
        assign: |c, v| c.phone = Some(v),
        placeholder: phone_missing,
    },
    MergeField {
        name: "name",
        existing: |l| &l.name,
        incoming: |s| &s.name,
        assign: |c, v| c.name = Some(v),
        placeholder: is_placeholder,
    },
    MergeField {
        name: "company",
        existing: |l| &l.company,
        incoming: |s| &s.company,
        assign: |c, v| c.company = Some(v),
        placeholder: is_placeholder,
    },
    MergeField {
        name: "source",
        existing: |l| &l.source,
        incoming: |s| &s.source,
        assign: |c, v| c.source = Some(v),
        placeholder: is_placeholder,
    },
    MergeField {
        name: "referrer",
        existing: |l| &l.attribution.referrer,
        incoming: |s| &s.attribution.referrer,
        assign: |c, v| c.referrer = Some(v),
        placeholder: is_placeholder,
    },
    MergeField {
        name: "utm_source",
        existing: |l| &l.attribution.utm_source,
        incoming: |s| &s.attribution.utm_source,
        assign: |c, v| c.utm_source = Some(v),
        placeholder: is_placeholder,
    },
    MergeField {
        name: "utm_medium",
        existing: |l| &l.attribution.utm_medium,
        incoming: |s| &s.attribution.utm_medium,
        assign: |c, v| c.utm_medium = Some(v),
        placeholder: is_placeholder,
    },
    MergeField {
        name: "utm_campaign",
        existing: |l| &l.attribution.utm_campaign,
        incoming: |s| &s.attribution.utm_campaign,
        assign: |c, v| c.utm_campaign = Some(v),
        placeholder: is_placeholder,
    },
];

/// Compute the change set for merging `new` into `existing`
///
/// Only fields that should change are set. Incoming notes are appended under
/// a `--- Update <timestamp> ---` header; `[auto-generated]` blocks already
/// present in the stored notes are dropped from the appended text.
pub fn merge_lead_data(existing: &Lead, new: &SanitizedLead, now: DateTime<Utc>) -> LeadChanges {
    let mut changes = LeadChanges::default();

    for field in MERGE_FIELDS {
        let current = (field.existing)(existing);
        let incoming = (field.incoming)(new);
        if (field.placeholder)(current) && !(field.placeholder)(incoming) {
            tracing::trace!(field = field.name, "Merging field into existing lead");
            (field.assign)(&mut changes, incoming.to_string());
        }
    }

    let has_value = |v: Option<f64>| v.is_some_and(|v| v > 0.0);
    if !has_value(existing.deal_value) && has_value(new.deal_value) {
        changes.deal_value = new.deal_value;
    }

    changes.notes = merge_notes(&existing.notes, &new.notes, now);
    changes
}

fn merge_notes(existing: &str, incoming: &str, now: DateTime<Utc>) -> Option<String> {
    let mut addition = incoming.to_string();
    for block in AUTO_BLOCK.find_iter(incoming) {
        if existing.contains(block.as_str()) {
            addition = addition.replacen(block.as_str(), "", 1);
        }
    }
    let addition = addition.trim();

    if addition.is_empty() {
        return None;
    }
    let existing = existing.trim_end();
    if existing.is_empty() {
        return Some(addition.to_string());
    }
    // same notes submitted again
    if last_section(existing) == addition {
        return None;
    }

    Some(format!(
        "{}\n\n--- Update {} ---\n{}",
        existing,
        now.format("%Y-%m-%d %H:%M UTC"),
        addition
    ))
}

/// Text after the last update header, or all of it when there is none
fn last_section(notes: &str) -> &str {
    let mut start = 0;
    let mut offset = 0;
    for line in notes.split_inclusive('\n') {
        offset += line.len();
        let header = line.trim_end();
        if header.starts_with("--- Update ") && header.ends_with(" ---") {
            start = offset;
        }
    }
    notes[start..].trim()
}

/// Finds the most recent lead for an identity inside the dedupe window
pub struct Deduplicator {
    store: Arc<dyn LeadStore>,
    clock: Arc<dyn Clock>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn LeadStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn find_duplicate(
        &self,
        tenant_id: &str,
        email: &str,
        window_len: Duration,
    ) -> Result<Option<Lead>> {
        let since = self.clock.now() - window(window_len)?;
        let recent = self.store.find_recent(tenant_id, email, since).await?;
        Ok(recent.into_iter().max_by_key(|l| l.created_at))
    }
}
