//! Trailing-window submission limits per identity

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use leadflow_core::{mask_email, Clock};
use leadflow_persistence::LeadStore;

use crate::error::{window, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RateLimitDecision {
    Allowed { count: usize },
    Limited { count: usize, max: usize },
}

impl RateLimitDecision {
    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Limited { .. })
    }

    /// Operator-facing explanation; not for the submitter
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Limited { count, max } => Some(format!(
                "{} submissions in window, limit is {}",
                count, max
            )),
            Self::Allowed { .. } => None,
        }
    }
}

/// Counts stored leads for a tenant + email inside a trailing window
///
/// Read-only: a check never writes to the store.
pub struct RateLimiter {
    store: Arc<dyn LeadStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn LeadStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn check_rate_limit(
        &self,
        tenant_id: &str,
        email: &str,
        window_len: Duration,
        max_submissions: usize,
    ) -> Result<RateLimitDecision> {
        let since = self.clock.now() - window(window_len)?;
        let count = self.store.count_recent(tenant_id, email, since).await?;

        if count >= max_submissions {
            tracing::info!(
                tenant_id = %tenant_id,
                email = %mask_email(email),
                count,
                max = max_submissions,
                "Submission rate limited"
            );
            return Ok(RateLimitDecision::Limited {
                count,
                max: max_submissions,
            });
        }

        Ok(RateLimitDecision::Allowed { count })
    }
}
