//! The scoring model
//!
//! Five bounded sub-scores with fixed coefficients, summed into a 0-100
//! aggregate, plus win probability, predicted days to close and a next
//! action. Pure: everything it needs is passed in.

use chrono::{DateTime, Utc};

use leadflow_core::score::{ENGAGEMENT_MAX, FIT_MAX, SOURCE_MAX, VALUE_MAX, VELOCITY_MAX};
use leadflow_core::{
    ActivityType, Lead, LeadActivity, LeadStatus, ScoreBreakdown, ScoreResult, ScoreTier,
};

use crate::benchmarks::TenantBenchmarks;
use crate::next_action::next_best_action;

/// Reasons and risks collected while scoring
#[derive(Default)]
struct Explanation {
    reasons: Vec<String>,
    risks: Vec<String>,
}

impl Explanation {
    fn reason(&mut self, text: impl Into<String>) {
        self.reasons.push(text.into());
    }

    fn risk(&mut self, text: impl Into<String>) {
        self.risks.push(text.into());
    }
}

/// Score one lead against tenant benchmarks
///
/// `activities` may be in any order.
pub fn score_lead(
    lead: &Lead,
    activities: &[LeadActivity],
    benchmarks: &TenantBenchmarks,
    now: DateTime<Utc>,
) -> ScoreResult {
    let mut recent: Vec<LeadActivity> = activities.to_vec();
    recent.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

    let mut why = Explanation::default();
    let breakdown = ScoreBreakdown {
        engagement: engagement_score(&recent, benchmarks, now, &mut why),
        source: source_score(lead, benchmarks, &mut why),
        value: value_score(lead.deal_value, benchmarks, &mut why),
        velocity: velocity_score(lead, benchmarks, now, &mut why),
        fit: fit_score(lead, &mut why),
    };
    let total = breakdown.total();

    ScoreResult {
        lead_id: lead.id,
        lead_name: lead.name.clone(),
        status: lead.status,
        source: lead.source.clone(),
        deal_value: lead.deal_value,
        breakdown,
        total_score: total,
        tier: ScoreTier::from_score(total),
        win_probability: win_probability(total, lead.status),
        predicted_close_days: predicted_close_days(lead.status, benchmarks),
        next_action: next_best_action(lead.status, &recent).to_string(),
        reasons: why.reasons,
        risk_factors: why.risks,
        scored_at: now,
    }
}

/// Volume relative to benchmark (0-15), recency (0-10), meetings (0-5)
fn engagement_score(
    recent: &[LeadActivity],
    benchmarks: &TenantBenchmarks,
    now: DateTime<Utc>,
    why: &mut Explanation,
) -> u8 {
    let Some(latest) = recent.first() else {
        why.risk("No recorded activity");
        return 0;
    };

    let count = recent.len();
    let ratio = if benchmarks.avg_activities > 0.0 {
        (count as f64 / benchmarks.avg_activities).min(1.5)
    } else {
        1.5
    };
    let volume = ((ratio * 10.0).round() as u8).min(15);
    if ratio >= 1.0 {
        why.reason(format!("{} touchpoints, at or above the typical won deal", count));
    }

    let idle_days = (now - latest.occurred_at).num_seconds().max(0) as f64 / 86_400.0;
    let recency = match idle_days {
        d if d <= 3.0 => 10,
        d if d <= 7.0 => 7,
        d if d <= 14.0 => 4,
        d if d <= 30.0 => 2,
        _ => 0,
    };
    if recency == 10 {
        why.reason("Active in the last 3 days");
    } else if idle_days > 14.0 {
        why.risk(format!("No activity in {} days", idle_days.floor() as u64));
    }

    let meetings = recent
        .iter()
        .filter(|a| a.activity_type == ActivityType::Meeting)
        .count();
    let meeting_bonus = (meetings * 2).min(5) as u8;
    if meetings > 0 {
        why.reason(format!("{} meeting(s) held", meetings));
    }

    (volume + recency + meeting_bonus).min(ENGAGEMENT_MAX)
}

/// Historical win rate of the lead's source
fn source_score(lead: &Lead, benchmarks: &TenantBenchmarks, why: &mut Explanation) -> u8 {
    let Some(rate) = benchmarks.source_win_rate(&lead.source) else {
        return 5;
    };

    let score = match rate {
        r if r >= 0.30 => 20,
        r if r >= 0.20 => 15,
        r if r >= 0.10 => 10,
        _ => 5,
    };
    let pct = (rate * 100.0).round();
    if score >= 15 {
        why.reason(format!("{} converts well ({}% win rate)", lead.source, pct));
    } else if score == 5 {
        why.risk(format!("{} rarely converts ({}% win rate)", lead.source, pct));
    }
    score.min(SOURCE_MAX)
}

/// Deal value relative to the tenant's average won deal
fn value_score(
    deal_value: Option<f64>,
    benchmarks: &TenantBenchmarks,
    why: &mut Explanation,
) -> u8 {
    let Some(value) = deal_value.filter(|v| v.is_finite() && *v > 0.0) else {
        why.risk("No deal value recorded");
        return 8;
    };

    let ratio = value / benchmarks.avg_deal_value;
    let score = match ratio {
        r if r >= 2.0 => 20,
        r if r >= 1.5 => 17,
        r if r >= 1.0 => 14,
        r if r >= 0.5 => 10,
        _ => 6,
    };
    if ratio >= 1.5 {
        why.reason(format!("Deal value {:.1}x the average won deal", ratio));
    } else if ratio < 0.5 {
        why.risk("Deal value well below average");
    }
    score.min(VALUE_MAX)
}

fn stage_base(status: LeadStatus) -> i16 {
    match status {
        LeadStatus::New => 0,
        LeadStatus::Contacted => 3,
        LeadStatus::Qualified => 6,
        LeadStatus::Proposal => 9,
        LeadStatus::Negotiation => 12,
        LeadStatus::Won => 15,
        LeadStatus::Lost => 0,
    }
}

/// Pipeline stage, adjusted for time open against the benchmark
fn velocity_score(
    lead: &Lead,
    benchmarks: &TenantBenchmarks,
    now: DateTime<Utc>,
    why: &mut Explanation,
) -> u8 {
    let mut score = stage_base(lead.status);
    let days_open = lead.days_open(now);
    let typical = benchmarks.avg_days_to_close;

    if lead.status.is_late_stage() && days_open < typical * 0.5 {
        score += 2;
        why.reason("Moving faster than the typical deal");
    }
    if !lead.status.is_terminal() && days_open > typical * 1.5 {
        score -= 3;
        why.risk(format!(
            "Open {} days, well past the typical {} day cycle",
            days_open.floor() as u64,
            typical.round() as u64
        ));
    }

    score.clamp(0, VELOCITY_MAX as i16) as u8
}

/// Profile completeness
fn fit_score(lead: &Lead, why: &mut Explanation) -> u8 {
    let fields = [
        &lead.name,
        &lead.email,
        &lead.phone,
        &lead.company,
        &lead.notes,
    ];
    let populated = fields.iter().filter(|f| !f.trim().is_empty()).count();
    let mut score = ((populated as f64 / fields.len() as f64) * 8.0).round() as u8;

    let has_company = !lead.company.trim().is_empty();
    let has_phone = !lead.phone.trim().is_empty();
    if has_company {
        score += 4;
    }
    if has_phone {
        score += 3;
    }

    if populated == fields.len() {
        why.reason("Complete contact profile");
    } else if !has_phone && !has_company {
        why.risk("No phone or company on file");
    }
    score.min(FIT_MAX)
}

fn stage_multiplier(status: LeadStatus) -> f64 {
    match status {
        LeadStatus::New => 0.3,
        LeadStatus::Contacted => 0.5,
        LeadStatus::Qualified => 0.7,
        LeadStatus::Proposal => 0.85,
        LeadStatus::Negotiation => 0.95,
        LeadStatus::Won => 1.0,
        LeadStatus::Lost => 0.0,
    }
}

/// Percent chance of winning; exact for terminal stages, 5-95 otherwise
pub fn win_probability(total: u8, status: LeadStatus) -> u8 {
    match status {
        LeadStatus::Won => 100,
        LeadStatus::Lost => 0,
        open => {
            let raw = total as f64 * 0.8 * stage_multiplier(open);
            raw.round().clamp(5.0, 95.0) as u8
        }
    }
}

fn stage_progress(status: LeadStatus) -> Option<f64> {
    match status {
        LeadStatus::New => Some(0.1),
        LeadStatus::Contacted => Some(0.3),
        LeadStatus::Qualified => Some(0.5),
        LeadStatus::Proposal => Some(0.7),
        LeadStatus::Negotiation => Some(0.9),
        LeadStatus::Won | LeadStatus::Lost => None,
    }
}

/// Expected days until close; `None` once the lead is won or lost
pub fn predicted_close_days(status: LeadStatus, benchmarks: &TenantBenchmarks) -> Option<u32> {
    let progress = stage_progress(status)?;
    let days = (benchmarks.avg_days_to_close * (1.0 - progress)).round();
    Some(days.max(1.0) as u32)
}
