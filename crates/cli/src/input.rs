//! JSON Lines input files

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use uuid::Uuid;

use leadflow_core::{ActivityType, LeadActivity};

/// One logged touchpoint, matched to a lead by email
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRecord {
    pub email: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl ActivityRecord {
    pub fn into_activity(self, tenant_id: &str, lead_id: Uuid) -> LeadActivity {
        let mut activity =
            LeadActivity::new(tenant_id, lead_id, self.activity_type, self.occurred_at);
        if let Some(outcome) = self.outcome {
            activity = activity.with_outcome(outcome);
        }
        if let Some(minutes) = self.duration_minutes {
            activity = activity.with_duration(minutes);
        }
        activity
    }
}

/// Parse one JSON value per non-blank line
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_lines(BufReader::new(file), path)
}

fn parse_lines<T: DeserializeOwned>(reader: impl BufRead, path: &Path) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), index + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::LeadSubmission;
    use std::io::Write;

    #[test]
    fn test_reads_submissions_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"email": "a@b.com", "name": "Ann"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"email": "c@d.com", "deal_value": 1200.5}}"#).unwrap();

        let records: Vec<LeadSubmission> = read_jsonl(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Ann"));
        assert_eq!(records[1].deal_value, Some(1200.5));
    }

    #[test]
    fn test_reports_failing_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"email": "a@b.com"}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        let err = read_jsonl::<LeadSubmission>(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(":2: invalid record"));
    }

    #[test]
    fn test_activity_record() {
        let line = r#"{"email": "a@b.com", "type": "meeting", "occurred_at": "2024-03-01T10:00:00Z", "duration_minutes": 30}"#;
        let record: ActivityRecord = serde_json::from_str(line).unwrap();
        let lead_id = Uuid::new_v4();

        let activity = record.into_activity("t1", lead_id);
        assert_eq!(activity.activity_type, ActivityType::Meeting);
        assert_eq!(activity.lead_id, lead_id);
        assert_eq!(activity.duration_minutes, Some(30));
        assert_eq!(activity.outcome, None);
    }
}
