//! Score types shared by the scoring engine, insights and persistence
//!
//! A lead's aggregate score is the sum of five independently bounded
//! sub-scores:
//! - Engagement (0-30)
//! - Source (0-20)
//! - Value (0-20)
//! - Velocity (0-15)
//! - Fit (0-15)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lead::LeadStatus;

pub const ENGAGEMENT_MAX: u8 = 30;
pub const SOURCE_MAX: u8 = 20;
pub const VALUE_MAX: u8 = 20;
pub const VELOCITY_MAX: u8 = 15;
pub const FIT_MAX: u8 = 15;

/// Priority band derived from the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    /// Score 0-29
    Cold,
    /// Score 30-49
    Cool,
    /// Score 50-69
    Warm,
    /// Score 70+
    Hot,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => Self::Cold,
            30..=49 => Self::Cool,
            50..=69 => Self::Warm,
            _ => Self::Hot,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Cool => "Cool",
            Self::Warm => "Warm",
            Self::Hot => "Hot",
        }
    }
}

/// Score breakdown by category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub engagement: u8,
    pub source: u8,
    pub value: u8,
    pub velocity: u8,
    pub fit: u8,
}

impl ScoreBreakdown {
    /// Aggregate score, capped at 100
    pub fn total(&self) -> u8 {
        let raw = self.engagement as u32
            + self.source as u32
            + self.value as u32
            + self.velocity as u32
            + self.fit as u32;
        raw.min(100) as u8
    }

    /// Whether every category sits inside its own bound
    pub fn within_bounds(&self) -> bool {
        self.engagement <= ENGAGEMENT_MAX
            && self.source <= SOURCE_MAX
            && self.value <= VALUE_MAX
            && self.velocity <= VELOCITY_MAX
            && self.fit <= FIT_MAX
    }
}

/// The persisted subset of a scoring run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub sub_scores: ScoreBreakdown,
    pub score: u8,
    pub win_probability: u8,
    pub scored_at: DateTime<Utc>,
}

/// Full output of scoring one lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub lead_id: Uuid,
    pub lead_name: String,
    pub status: LeadStatus,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,

    pub breakdown: ScoreBreakdown,
    pub total_score: u8,
    pub tier: ScoreTier,
    pub win_probability: u8,
    pub predicted_close_days: Option<u32>,
    pub next_action: String,

    /// Positive signals, for display only
    pub reasons: Vec<String>,
    /// Negative signals, for display only
    pub risk_factors: Vec<String>,

    pub scored_at: DateTime<Utc>,
}

impl ScoreResult {
    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            sub_scores: self.breakdown,
            score: self.total_score,
            win_probability: self.win_probability,
            scored_at: self.scored_at,
        }
    }
}
