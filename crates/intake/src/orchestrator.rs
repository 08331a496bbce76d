//! Intake pipeline
//!
//! sanitize -> reject empty email -> spam -> rate limit -> dedupe / merge
//!
//! Ordering matters: the classifier only ever sees sanitized text, spam is
//! rejected before it can consume an identity's rate budget, and dedupe runs
//! only for submissions that are allowed in at all.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use leadflow_config::{IntakeConfig, SpamConfig};
use leadflow_core::{mask_email, Clock, Lead, LeadSubmission, SanitizedLead};
use leadflow_persistence::LeadStore;
use leadflow_text_processing::{sanitize_lead_data, SpamClassifier, SpamRule, SpamVerdict};

use crate::dedupe::{merge_lead_data, Deduplicator};
use crate::error::Result;
use crate::locks::IdentityLocks;
use crate::rate_limit::{RateLimitDecision, RateLimiter};

/// Prune idle identity locks once the map grows past this
const LOCK_PRUNE_THRESHOLD: usize = 1_024;

const GENERIC_REJECTION: &str = "Thank you, your submission has been received.";

/// Why a submission was turned away
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    InvalidEmail,
    Spam { rule: SpamRule, reason: String },
    RateLimited { count: usize, max: usize },
}

impl Rejection {
    /// Silent rejections look like success to the submitter
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Spam { .. } | Self::RateLimited { .. })
    }

    /// Text an API layer may show the submitter
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "Please provide a valid email address.",
            Self::Spam { .. } | Self::RateLimited { .. } => GENERIC_REJECTION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::Spam { .. } => "spam",
            Self::RateLimited { .. } => "rate_limited",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "invalid email"),
            Self::Spam { reason, .. } => write!(f, "spam: {}", reason),
            Self::RateLimited { count, max } => {
                write!(f, "rate limited: {} submissions, limit {}", count, max)
            }
        }
    }
}

/// Result of `process_lead`
#[derive(Debug, Clone)]
pub struct IntakeResult {
    pub sanitized: SanitizedLead,
    pub rejection: Option<Rejection>,
    /// Existing lead the submission was merged into, after the merge
    pub merged: Option<Lead>,
}

impl IntakeResult {
    fn rejected(sanitized: SanitizedLead, rejection: Rejection) -> Self {
        Self {
            sanitized,
            rejection: Some(rejection),
            merged: None,
        }
    }
}

/// Result of `submit`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    Created { lead: Lead },
    Merged { lead: Lead },
    Rejected {
        sanitized: SanitizedLead,
        rejection: Rejection,
    },
}

impl IntakeOutcome {
    pub fn lead(&self) -> Option<&Lead> {
        match self {
            Self::Created { lead } | Self::Merged { lead } => Some(lead),
            Self::Rejected { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected { rejection, .. } => Some(rejection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Merged { .. } => "merged",
            Self::Rejected { rejection, .. } => rejection.as_str(),
        }
    }
}

/// Composes sanitizer, spam classifier, rate limiter and deduplicator
pub struct IntakeOrchestrator {
    store: Arc<dyn LeadStore>,
    classifier: SpamClassifier,
    rate_limiter: RateLimiter,
    deduplicator: Deduplicator,
    locks: IdentityLocks,
    clock: Arc<dyn Clock>,
    config: IntakeConfig,
}

impl IntakeOrchestrator {
    pub fn new(
        store: Arc<dyn LeadStore>,
        config: IntakeConfig,
        spam: SpamConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rate_limiter: RateLimiter::new(store.clone(), clock.clone()),
            deduplicator: Deduplicator::new(store.clone(), clock.clone()),
            classifier: SpamClassifier::new(spam),
            locks: IdentityLocks::new(),
            store,
            clock,
            config,
        }
    }

    /// Run the pipeline without inserting new leads
    ///
    /// A dedupe hit updates the existing lead and returns it in `merged`. A
    /// rejection leaves the store untouched.
    pub async fn process_lead(
        &self,
        tenant_id: &str,
        raw: &LeadSubmission,
        dedupe_window: Duration,
        rate_window: Duration,
        rate_max: usize,
    ) -> Result<IntakeResult> {
        let sanitized = sanitize_lead_data(tenant_id, raw, &self.config.field_limits);
        if let Some(rejection) = self.screen(&sanitized) {
            return Ok(IntakeResult::rejected(sanitized, rejection));
        }

        let _guard = self.locks.acquire(tenant_id, &sanitized.email).await;
        self.decide(sanitized, dedupe_window, rate_window, rate_max)
            .await
    }

    /// Run the pipeline with the configured windows and store new leads
    ///
    /// The decision and the insert happen under one identity lock.
    pub async fn submit(&self, tenant_id: &str, raw: &LeadSubmission) -> Result<IntakeOutcome> {
        let sanitized = sanitize_lead_data(tenant_id, raw, &self.config.field_limits);
        if let Some(rejection) = self.screen(&sanitized) {
            return Ok(self.finish(IntakeOutcome::Rejected {
                sanitized,
                rejection,
            }));
        }

        let outcome = {
            let _guard = self.locks.acquire(tenant_id, &sanitized.email).await;
            let result = self
                .decide(
                    sanitized,
                    self.config.dedupe_window(),
                    self.config.rate_limit_window(),
                    self.config.rate_limit_max,
                )
                .await?;

            match result {
                IntakeResult {
                    sanitized,
                    rejection: Some(rejection),
                    ..
                } => IntakeOutcome::Rejected {
                    sanitized,
                    rejection,
                },
                IntakeResult {
                    merged: Some(lead), ..
                } => IntakeOutcome::Merged { lead },
                IntakeResult { sanitized, .. } => {
                    let lead = Lead::from_sanitized(&sanitized, self.clock.now());
                    self.store.insert(&lead).await?;
                    tracing::info!(
                        tenant_id = %lead.tenant_id,
                        lead_id = %lead.id,
                        email = %mask_email(&lead.email),
                        source = %lead.source,
                        "Lead created"
                    );
                    IntakeOutcome::Created { lead }
                }
            }
        };

        if self.locks.len() > LOCK_PRUNE_THRESHOLD {
            self.locks.prune();
        }

        Ok(self.finish(outcome))
    }

    /// Checks that need no store access: email presence and spam
    fn screen(&self, sanitized: &SanitizedLead) -> Option<Rejection> {
        if sanitized.email.is_empty() {
            tracing::info!(tenant_id = %sanitized.tenant_id, "Submission rejected: invalid email");
            return Some(Rejection::InvalidEmail);
        }

        if let SpamVerdict::Spam { rule, reason } = self.classifier.is_spam(sanitized) {
            tracing::info!(
                tenant_id = %sanitized.tenant_id,
                email = %mask_email(&sanitized.email),
                rule = %rule,
                reason = %reason,
                "Submission rejected as spam"
            );
            metrics::counter!("leadflow_spam_rejections_total", "rule" => rule.as_str())
                .increment(1);
            return Some(Rejection::Spam { rule, reason });
        }

        None
    }

    /// Rate limit and dedupe; caller holds the identity lock
    async fn decide(
        &self,
        sanitized: SanitizedLead,
        dedupe_window: Duration,
        rate_window: Duration,
        rate_max: usize,
    ) -> Result<IntakeResult> {
        let tenant_id = sanitized.tenant_id.as_str();
        let email = sanitized.email.as_str();

        let decision = self
            .rate_limiter
            .check_rate_limit(tenant_id, email, rate_window, rate_max)
            .await?;
        if let RateLimitDecision::Limited { count, max } = decision {
            return Ok(IntakeResult::rejected(
                sanitized,
                Rejection::RateLimited { count, max },
            ));
        }

        let Some(existing) = self
            .deduplicator
            .find_duplicate(tenant_id, email, dedupe_window)
            .await?
        else {
            return Ok(IntakeResult {
                sanitized,
                rejection: None,
                merged: None,
            });
        };

        let now = self.clock.now();
        let changes = merge_lead_data(&existing, &sanitized, now);
        let merged = if changes.is_empty() {
            Some(existing)
        } else {
            self.store
                .update_fields(tenant_id, existing.id, &changes, now)
                .await?
        };

        match &merged {
            Some(lead) => tracing::info!(
                tenant_id = %tenant_id,
                lead_id = %lead.id,
                fields = ?changes.changed_fields(),
                "Submission merged into existing lead"
            ),
            None => tracing::warn!(
                tenant_id = %tenant_id,
                email = %mask_email(email),
                "Duplicate vanished before merge; treating submission as new"
            ),
        }

        Ok(IntakeResult {
            sanitized,
            rejection: None,
            merged,
        })
    }

    fn finish(&self, outcome: IntakeOutcome) -> IntakeOutcome {
        metrics::counter!("leadflow_intake_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leadflow_core::ManualClock;
    use leadflow_persistence::InMemoryLeadStore;

    fn orchestrator(store: Arc<InMemoryLeadStore>) -> IntakeOrchestrator {
        IntakeOrchestrator::new(
            store,
            IntakeConfig::default(),
            SpamConfig::default(),
            Arc::new(ManualClock::new(Utc::now())),
        )
    }

    fn submission(email: &str) -> LeadSubmission {
        LeadSubmission {
            email: Some(email.to_string()),
            name: Some("Ann".to_string()),
            source: Some("Website Form".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejection_visibility() {
        assert!(!Rejection::InvalidEmail.is_silent());
        let spam = Rejection::Spam {
            rule: SpamRule::BlacklistedKeyword,
            reason: "Blacklisted keyword: casino".to_string(),
        };
        assert!(spam.is_silent());
        assert!(!spam.public_message().contains("casino"));
        assert_eq!(
            spam.public_message(),
            Rejection::RateLimited { count: 3, max: 3 }.public_message()
        );
    }

    #[tokio::test]
    async fn test_invalid_email_rejected_without_store_write() {
        let store = Arc::new(InMemoryLeadStore::new());
        let intake = orchestrator(store.clone());

        let outcome = intake.submit("t1", &submission("not-an-email")).await.unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::InvalidEmail));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_spam_checked_on_sanitized_text() {
        let store = Arc::new(InMemoryLeadStore::new());
        let intake = orchestrator(store.clone());

        let mut raw = submission("ann@acme.com");
        raw.notes = Some("Great c<b></b>asino &amp; more".to_string());
        let outcome = intake.submit("t1", &raw).await.unwrap();

        match outcome.rejection() {
            Some(Rejection::Spam { rule, .. }) => assert_eq!(*rule, SpamRule::BlacklistedKeyword),
            other => panic!("expected spam rejection, got {:?}", other),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_process_lead_does_not_insert() {
        let store = Arc::new(InMemoryLeadStore::new());
        let intake = orchestrator(store.clone());

        let result = intake
            .process_lead(
                "t1",
                &submission("ann@acme.com"),
                Duration::from_secs(86_400),
                Duration::from_secs(300),
                3,
            )
            .await
            .unwrap();
        assert!(result.rejection.is_none());
        assert!(result.merged.is_none());
        assert_eq!(result.sanitized.email, "ann@acme.com");
        assert!(store.is_empty());
    }
}
