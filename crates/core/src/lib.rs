//! Core types for the lead intake and scoring pipeline
//!
//! This crate provides foundational types used across all other crates:
//! - Lead records, lifecycle status and attribution
//! - Lead activities (calls, emails, meetings, notes)
//! - Raw and sanitized submissions, merge change sets
//! - Score breakdowns, snapshots and results
//! - Clock abstraction for windowed checks

pub mod activity;
pub mod clock;
pub mod lead;
pub mod score;
pub mod submission;

pub use activity::{ActivityType, LeadActivity};
pub use clock::{Clock, ManualClock, SystemClock};
pub use lead::{Attribution, Lead, LeadStatus};
pub use score::{ScoreBreakdown, ScoreResult, ScoreSnapshot, ScoreTier};
pub use submission::{LeadChanges, LeadSubmission, SanitizedLead};

/// Mask an email for logging (`a***@example.com`)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("garbage"), "***");
    }
}
