//! Recommended next step per lead
//!
//! An ordered rule table keyed by stage and by which activity type is absent
//! from the three most recent activities. First match wins.

use leadflow_core::{ActivityType, LeadActivity, LeadStatus};

/// How many of the latest activities are inspected
const RECENT_WINDOW: usize = 3;

const FALLBACK_ACTION: &str = "Review the lead and log the next touchpoint";

pub struct NextActionRule {
    pub name: &'static str,
    pub stage: LeadStatus,
    /// Fires only when this type is missing from the recent activities
    pub missing: Option<ActivityType>,
    pub action: &'static str,
}

pub const NEXT_ACTION_RULES: &[NextActionRule] = &[
    NextActionRule {
        name: "new_uncalled",
        stage: LeadStatus::New,
        missing: Some(ActivityType::Call),
        action: "Call within 24 hours to qualify",
    },
    NextActionRule {
        name: "new_default",
        stage: LeadStatus::New,
        missing: None,
        action: "Send a personalised introduction email",
    },
    NextActionRule {
        name: "contacted_no_meeting",
        stage: LeadStatus::Contacted,
        missing: Some(ActivityType::Meeting),
        action: "Book a discovery meeting",
    },
    NextActionRule {
        name: "contacted_default",
        stage: LeadStatus::Contacted,
        missing: None,
        action: "Follow up by email with relevant case studies",
    },
    NextActionRule {
        name: "qualified_no_meeting",
        stage: LeadStatus::Qualified,
        missing: Some(ActivityType::Meeting),
        action: "Schedule a solution demo",
    },
    NextActionRule {
        name: "qualified_default",
        stage: LeadStatus::Qualified,
        missing: None,
        action: "Prepare and send a proposal",
    },
    NextActionRule {
        name: "proposal_no_call",
        stage: LeadStatus::Proposal,
        missing: Some(ActivityType::Call),
        action: "Call to walk through the proposal",
    },
    NextActionRule {
        name: "proposal_default",
        stage: LeadStatus::Proposal,
        missing: None,
        action: "Address open objections and agree next steps",
    },
    NextActionRule {
        name: "negotiation_no_meeting",
        stage: LeadStatus::Negotiation,
        missing: Some(ActivityType::Meeting),
        action: "Meet to finalise terms",
    },
    NextActionRule {
        name: "negotiation_default",
        stage: LeadStatus::Negotiation,
        missing: None,
        action: "Send the contract for signature",
    },
    NextActionRule {
        name: "won",
        stage: LeadStatus::Won,
        missing: None,
        action: "Start onboarding and ask for a referral",
    },
    NextActionRule {
        name: "lost",
        stage: LeadStatus::Lost,
        missing: None,
        action: "Schedule a win-back check-in in 90 days",
    },
];

/// First matching rule for `status`; `activities` must be newest first
pub fn next_best_action(status: LeadStatus, activities: &[LeadActivity]) -> &'static str {
    let recent = &activities[..activities.len().min(RECENT_WINDOW)];
    let absent = |kind: ActivityType| !recent.iter().any(|a| a.activity_type == kind);

    NEXT_ACTION_RULES
        .iter()
        .find(|rule| rule.stage == status && rule.missing.map_or(true, absent))
        .map(|rule| {
            tracing::trace!(rule = rule.name, "Next action rule matched");
            rule.action
        })
        .unwrap_or(FALLBACK_ACTION)
}
