//! Intake pipeline configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{field_limits, intake};

/// Windows and limits applied to public submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Lookback for treating a submission as a duplicate of an existing lead
    #[serde(default = "default_dedupe_window_secs")]
    pub dedupe_window_secs: u64,

    /// Lookback for counting submissions per identity
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Submissions allowed per identity inside the rate limit window
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: usize,

    /// Field length caps
    #[serde(default)]
    pub field_limits: FieldLimits,
}

fn default_dedupe_window_secs() -> u64 {
    intake::DEDUPE_WINDOW_SECS
}

fn default_rate_limit_window_secs() -> u64 {
    intake::RATE_LIMIT_WINDOW_SECS
}

fn default_rate_limit_max() -> usize {
    intake::RATE_LIMIT_MAX
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            dedupe_window_secs: default_dedupe_window_secs(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            rate_limit_max: default_rate_limit_max(),
            field_limits: FieldLimits::default(),
        }
    }
}

impl IntakeConfig {
    pub fn dedupe_window(&self) -> Duration {
        Duration::from_secs(self.dedupe_window_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

/// Maximum lengths (in characters) of sanitized fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    pub name: usize,
    pub company: usize,
    pub notes: usize,
    pub source: usize,
    pub attribution: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            name: field_limits::NAME,
            company: field_limits::COMPANY,
            notes: field_limits::NOTES,
            source: field_limits::SOURCE,
            attribution: field_limits::ATTRIBUTION,
        }
    }
}
