//! Text processing for untrusted lead submissions
//!
//! This crate provides the two pure-text stages of intake:
//! - **Sanitizer**: entity decoding, markup and control character stripping,
//!   whitespace collapse, length caps, email / phone / name normalisation
//! - **Spam classification**: ordered heuristic rules over sanitized fields
//!
//! # Example
//!
//! ```ignore
//! use leadflow_text_processing::{sanitize_lead_data, SpamClassifier};
//!
//! let lead = sanitize_lead_data("tenant-1", &raw, &settings.intake.field_limits);
//! let verdict = SpamClassifier::new(settings.spam.clone()).is_spam(&lead);
//! ```

pub mod sanitizer;
pub mod spam;

pub use sanitizer::{
    is_placeholder, sanitize_email, sanitize_lead_data, sanitize_name, sanitize_phone,
    sanitize_string,
};
pub use spam::{SpamClassifier, SpamRule, SpamVerdict};
