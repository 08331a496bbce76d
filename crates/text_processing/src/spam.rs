//! Heuristic spam classification over sanitized submissions
//!
//! Rules run in a fixed order and the first one that fires decides the
//! verdict. Reasons are for logs and operators only; callers must not echo
//! them back to the submitter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use leadflow_config::SpamConfig;
use leadflow_core::SanitizedLead;

static URL_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:https?|ftp)://").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:https?|ftp)://\S+").unwrap());

/// Named spam heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamRule {
    DisposableDomain,
    BlacklistedKeyword,
    ExcessiveLinks,
    LongUrl,
    Shouting,
    RepeatedCharacters,
}

impl SpamRule {
    /// Evaluation order; earlier rules win
    pub const ORDER: [SpamRule; 6] = [
        SpamRule::DisposableDomain,
        SpamRule::BlacklistedKeyword,
        SpamRule::ExcessiveLinks,
        SpamRule::LongUrl,
        SpamRule::Shouting,
        SpamRule::RepeatedCharacters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisposableDomain => "disposable_domain",
            Self::BlacklistedKeyword => "blacklisted_keyword",
            Self::ExcessiveLinks => "excessive_links",
            Self::LongUrl => "long_url",
            Self::Shouting => "shouting",
            Self::RepeatedCharacters => "repeated_characters",
        }
    }
}

impl std::fmt::Display for SpamRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SpamVerdict {
    Clean,
    Spam { rule: SpamRule, reason: String },
}

impl SpamVerdict {
    pub fn is_spam(&self) -> bool {
        matches!(self, Self::Spam { .. })
    }

    pub fn rule(&self) -> Option<SpamRule> {
        match self {
            Self::Spam { rule, .. } => Some(*rule),
            Self::Clean => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Spam { reason, .. } => Some(reason),
            Self::Clean => None,
        }
    }
}

/// Rule-based spam classifier
pub struct SpamClassifier {
    disposable_domains: Vec<String>,
    keywords: Vec<String>,
    config: SpamConfig,
}

impl SpamClassifier {
    pub fn new(config: SpamConfig) -> Self {
        let disposable_domains = config
            .disposable_domains
            .iter()
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        let keywords = config
            .blacklisted_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            disposable_domains,
            keywords,
            config,
        }
    }

    /// Run the rules in order and stop at the first hit
    pub fn is_spam(&self, lead: &SanitizedLead) -> SpamVerdict {
        for rule in SpamRule::ORDER {
            if let Some(reason) = self.evaluate(rule, lead) {
                tracing::debug!(tenant_id = %lead.tenant_id, rule = %rule, "Spam rule matched");
                return SpamVerdict::Spam { rule, reason };
            }
        }
        SpamVerdict::Clean
    }

    fn evaluate(&self, rule: SpamRule, lead: &SanitizedLead) -> Option<String> {
        match rule {
            SpamRule::DisposableDomain => self.check_disposable(&lead.email),
            SpamRule::BlacklistedKeyword => self.check_keywords(lead),
            SpamRule::ExcessiveLinks => self.check_link_count(&lead.notes),
            SpamRule::LongUrl => self.check_url_length(&lead.notes),
            SpamRule::Shouting => self.check_shouting(&lead.notes),
            SpamRule::RepeatedCharacters => self.check_repeated(lead),
        }
    }

    fn check_disposable(&self, email: &str) -> Option<String> {
        let (_, domain) = email.rsplit_once('@')?;
        self.disposable_domains
            .iter()
            .find(|d| {
                domain == d.as_str()
                    || domain
                        .strip_suffix(d.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .map(|d| format!("Disposable email domain: {}", d))
    }

    fn check_keywords(&self, lead: &SanitizedLead) -> Option<String> {
        let combined = format!("{} {} {}", lead.name, lead.notes, lead.company).to_lowercase();
        self.keywords
            .iter()
            .find(|k| combined.contains(k.as_str()))
            .map(|k| format!("Blacklisted keyword: {}", k))
    }

    fn check_link_count(&self, notes: &str) -> Option<String> {
        let links = URL_SCHEME.find_iter(notes).count();
        (links > self.config.max_links).then(|| format!("Too many links: {}", links))
    }

    fn check_url_length(&self, notes: &str) -> Option<String> {
        URL.find_iter(notes)
            .map(|m| m.as_str().chars().count())
            .find(|len| *len > self.config.max_url_length)
            .map(|len| format!("Suspiciously long URL: {} characters", len))
    }

    fn check_shouting(&self, notes: &str) -> Option<String> {
        if notes.chars().count() <= self.config.min_shouting_length {
            return None;
        }
        let total = notes.chars().count();
        let upper = notes.chars().filter(|c| c.is_uppercase()).count();
        let ratio = upper as f32 / total as f32;
        (ratio > self.config.uppercase_ratio)
            .then(|| format!("Excessive capitals: {:.0}% uppercase", ratio * 100.0))
    }

    fn check_repeated(&self, lead: &SanitizedLead) -> Option<String> {
        lead.text_fields().into_iter().find_map(|(field, value)| {
            longest_run(value, self.config.max_repeated_chars).map(|c| {
                format!("Character '{}' repeated in {}", c, field)
            })
        })
    }
}

/// First character repeated at least `limit` times in a row
fn longest_run(value: &str, limit: usize) -> Option<char> {
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for c in value.chars() {
        if prev == Some(c) {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= limit {
            return Some(c);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead() -> SanitizedLead {
        SanitizedLead {
            tenant_id: "t1".to_string(),
            email: "ann@acme.com".to_string(),
            name: "Ann Lee".to_string(),
            company: "Acme".to_string(),
            notes: "Interested in a demo next week".to_string(),
            ..Default::default()
        }
    }

    fn classifier() -> SpamClassifier {
        SpamClassifier::new(SpamConfig::default())
    }

    #[test]
    fn test_clean_submission() {
        assert_eq!(classifier().is_spam(&lead()), SpamVerdict::Clean);
    }

    #[test]
    fn test_disposable_domain_and_subdomain() {
        let mut l = lead();
        l.email = "x@mailinator.com".to_string();
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::DisposableDomain));

        l.email = "x@eu.mailinator.com".to_string();
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::DisposableDomain));

        l.email = "x@notmailinator.com".to_string();
        assert!(!classifier().is_spam(&l).is_spam());
    }

    #[test]
    fn test_domain_rule_wins_over_keyword() {
        let mut l = lead();
        l.email = "x@yopmail.com".to_string();
        l.notes = "Best CASINO bonuses".to_string();
        let verdict = classifier().is_spam(&l);
        assert_eq!(verdict.rule(), Some(SpamRule::DisposableDomain));
        assert!(verdict.reason().unwrap().contains("yopmail.com"));
    }

    #[test]
    fn test_keyword_reason_names_keyword() {
        let mut l = lead();
        l.company = "Payday Loan Experts".to_string();
        let verdict = classifier().is_spam(&l);
        assert_eq!(verdict.rule(), Some(SpamRule::BlacklistedKeyword));
        assert!(verdict.reason().unwrap().contains("payday loan"));
    }

    #[test]
    fn test_link_rules() {
        let mut l = lead();
        l.notes = "see http://a.io http://b.io https://c.io".to_string();
        assert!(!classifier().is_spam(&l).is_spam());

        l.notes = "see http://a.io http://b.io https://c.io ftp://d.io".to_string();
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::ExcessiveLinks));

        l.notes = format!("details at https://example.com/{}", "p".repeat(60));
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::LongUrl));
    }

    #[test]
    fn test_shouting() {
        let mut l = lead();
        l.notes = "PLEASE CALL ME BACK TODAY".to_string();
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::Shouting));

        // too short to count
        l.notes = "CALL ME TODAY".to_string();
        assert!(!classifier().is_spam(&l).is_spam());

        l.notes = "We use AWS, GCP and SQL for reporting".to_string();
        assert!(!classifier().is_spam(&l).is_spam());
    }

    #[test]
    fn test_repeated_characters() {
        let mut l = lead();
        l.name = "Annnnnnn".to_string();
        let verdict = classifier().is_spam(&l);
        assert_eq!(verdict.rule(), Some(SpamRule::RepeatedCharacters));
        assert!(verdict.reason().unwrap().contains("name"));

        l.name = "Ann".to_string();
        l.notes = "Budget around 100000 this year".to_string();
        assert!(!classifier().is_spam(&l).is_spam());

        l.notes = "hello!!!!!!".to_string();
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::RepeatedCharacters));
    }

    #[test]
    fn test_repeated_digits_count() {
        let mut l = lead();
        l.notes = "call 0000000000 or 1111111".to_string();
        let verdict = classifier().is_spam(&l);
        assert_eq!(verdict.rule(), Some(SpamRule::RepeatedCharacters));
        assert!(verdict.reason().unwrap().contains("'0'"));

        l.notes = "Budget around 1000000 this year".to_string();
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::RepeatedCharacters));
    }

    #[test]
    fn test_repeated_characters_in_attribution() {
        let mut l = lead();
        l.attribution.utm_campaign = "spring_zzzzzzzz".to_string();
        let verdict = classifier().is_spam(&l);
        assert_eq!(verdict.rule(), Some(SpamRule::RepeatedCharacters));
        assert!(verdict.reason().unwrap().contains("utm_campaign"));

        let mut l = lead();
        l.source = "Webbbbbbbb".to_string();
        assert!(classifier().is_spam(&l).reason().unwrap().contains("source"));
    }

    #[test]
    fn test_shouting_ratio_counts_every_character() {
        let mut l = lead();
        // 9 capitals out of 31 characters
        l.notes = "INVOICE 2024-0193 / PO 555-7781".to_string();
        assert!(!classifier().is_spam(&l).is_spam());

        l.notes = "CALL ABOUT ORDER 12 NOW".to_string();
        assert_eq!(classifier().is_spam(&l).rule(), Some(SpamRule::Shouting));
    }

    #[test]
    fn test_custom_keywords_are_normalised() {
        let config = SpamConfig {
            blacklisted_keywords: vec!["  TimeShare ".to_string(), String::new()],
            ..Default::default()
        };
        let mut l = lead();
        l.notes = "Ask me about my timeshare".to_string();
        let verdict = SpamClassifier::new(config).is_spam(&l);
        assert_eq!(verdict.rule(), Some(SpamRule::BlacklistedKeyword));
    }
}
