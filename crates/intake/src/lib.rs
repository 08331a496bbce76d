//! Lead intake pipeline
//!
//! Turns an untrusted public submission into either a rejection, a merge
//! into an existing lead, or a new lead:
//! - [`RateLimiter`]: trailing-window submission counts per identity
//! - [`Deduplicator`]: trailing-window duplicate lookup and field merge
//! - [`IdentityLocks`]: serialises decisions for one `(tenant, email)`
//! - [`IntakeOrchestrator`]: the ordered pipeline

pub mod dedupe;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod rate_limit;

pub use dedupe::{merge_lead_data, Deduplicator};
pub use error::{IntakeError, Result};
pub use locks::IdentityLocks;
pub use orchestrator::{IntakeOrchestrator, IntakeOutcome, IntakeResult, Rejection};
pub use rate_limit::{RateLimitDecision, RateLimiter};
