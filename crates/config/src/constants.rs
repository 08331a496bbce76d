//! Centralized constants for lead intake and scoring
//!
//! Single source of truth for default values used across the workspace.
//! Anything a tenant operator may want to tune is also exposed through
//! `Settings`; these are the values used when nothing is configured.

/// Trailing windows and submission limits
pub mod intake {
    /// Dedupe lookback: one day
    pub const DEDUPE_WINDOW_SECS: u64 = 86_400;

    /// Rate limit lookback: five minutes
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 300;

    /// Submissions allowed per identity inside the rate limit window
    pub const RATE_LIMIT_MAX: usize = 3;
}

/// Field length caps applied by the sanitizer
pub mod field_limits {
    pub const NAME: usize = 200;
    pub const COMPANY: usize = 200;
    pub const NOTES: usize = 5_000;
    pub const SOURCE: usize = 100;
    pub const ATTRIBUTION: usize = 200;
    pub const EMAIL: usize = 254;
}

/// Spam heuristics thresholds
pub mod spam {
    /// More URL schemes than this in the notes is spam
    pub const MAX_LINKS: usize = 3;

    /// A single URL longer than this is spam
    pub const MAX_URL_LENGTH: usize = 50;

    /// Uppercase share of letters above which notes count as shouting
    pub const UPPERCASE_RATIO: f32 = 0.7;

    /// Notes must be longer than this before the shouting rule applies
    pub const MIN_SHOUTING_LENGTH: usize = 20;

    /// Same character this many times in a row is spam
    pub const MAX_REPEATED_CHARS: usize = 6;

    pub const DISPOSABLE_DOMAINS: &[&str] = &[
        "mailinator.com",
        "guerrillamail.com",
        "guerrillamail.net",
        "10minutemail.com",
        "tempmail.com",
        "temp-mail.org",
        "throwawaymail.com",
        "yopmail.com",
        "trashmail.com",
        "sharklasers.com",
        "getnada.com",
        "dispostable.com",
        "maildrop.cc",
        "fakeinbox.com",
        "mailnesia.com",
        "discard.email",
        "mintemail.com",
        "spamgourmet.com",
    ];

    pub const BLACKLISTED_KEYWORDS: &[&str] = &[
        "viagra",
        "cialis",
        "casino",
        "lottery",
        "payday loan",
        "crypto investment",
        "bitcoin investment",
        "forex signals",
        "make money fast",
        "work from home",
        "seo services",
        "buy followers",
        "backlinks",
        "click here",
        "weight loss pills",
    ];
}

/// Benchmark fallbacks for tenants with little or no history
pub mod benchmarks {
    pub const DEFAULT_AVG_DEAL_VALUE: f64 = 50_000.0;
    pub const DEFAULT_AVG_ACTIVITIES: f64 = 10.0;
    pub const DEFAULT_AVG_DAYS_TO_CLOSE: f64 = 30.0;

    /// Samples required before a historical average replaces its default
    pub const MIN_HISTORY: usize = 3;
}

/// Insights rollups
pub mod insights {
    pub const TOP_N: usize = 10;
    pub const TOP_SOURCES: usize = 5;
}

/// ScyllaDB defaults
pub mod persistence {
    pub const DEFAULT_HOST: &str = "127.0.0.1:9042";
    pub const DEFAULT_KEYSPACE: &str = "leadflow";
}
