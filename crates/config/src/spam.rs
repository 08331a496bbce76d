//! Spam heuristics configuration
//!
//! Loaded from the `spam` section of the settings, or from a standalone YAML
//! file so operators can extend the domain and keyword lists without a
//! redeploy:
//!
//! ```yaml
//! disposable_domains:
//!   - mailinator.com
//! blacklisted_keywords:
//!   - casino
//! max_links: 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::constants::spam;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamConfig {
    /// Throwaway email domains; subdomains match too
    #[serde(default = "default_disposable_domains")]
    pub disposable_domains: Vec<String>,

    /// Case-insensitive substrings rejected in name, notes and company
    #[serde(default = "default_blacklisted_keywords")]
    pub blacklisted_keywords: Vec<String>,

    #[serde(default = "default_max_links")]
    pub max_links: usize,

    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,

    #[serde(default = "default_uppercase_ratio")]
    pub uppercase_ratio: f32,

    #[serde(default = "default_min_shouting_length")]
    pub min_shouting_length: usize,

    #[serde(default = "default_max_repeated_chars")]
    pub max_repeated_chars: usize,
}

fn default_disposable_domains() -> Vec<String> {
    spam::DISPOSABLE_DOMAINS.iter().map(|d| d.to_string()).collect()
}

fn default_blacklisted_keywords() -> Vec<String> {
    spam::BLACKLISTED_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_max_links() -> usize {
    spam::MAX_LINKS
}

fn default_max_url_length() -> usize {
    spam::MAX_URL_LENGTH
}

fn default_uppercase_ratio() -> f32 {
    spam::UPPERCASE_RATIO
}

fn default_min_shouting_length() -> usize {
    spam::MIN_SHOUTING_LENGTH
}

fn default_max_repeated_chars() -> usize {
    spam::MAX_REPEATED_CHARS
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            disposable_domains: default_disposable_domains(),
            blacklisted_keywords: default_blacklisted_keywords(),
            max_links: default_max_links(),
            max_url_length: default_max_url_length(),
            uppercase_ratio: default_uppercase_ratio(),
            min_shouting_length: default_min_shouting_length(),
            max_repeated_chars: default_max_repeated_chars(),
        }
    }
}

impl SpamConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SpamConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SpamConfigError::FileNotFound(path.as_ref().display().to_string(), e.to_string())
        })?;

        serde_yaml::from_str(&content).map_err(|e| SpamConfigError::ParseError(e.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum SpamConfigError {
    #[error("Spam config file not found: {0}: {1}")]
    FileNotFound(String, String),

    #[error("Failed to parse spam config: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SpamConfig::default();
        assert!(config.disposable_domains.iter().any(|d| d == "mailinator.com"));
        assert!(config.blacklisted_keywords.iter().any(|k| k == "casino"));
        assert_eq!(config.max_links, 3);
        assert_eq!(config.max_repeated_chars, 6);
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "blacklisted_keywords:\n  - timeshare\nmax_links: 5").unwrap();

        let config = SpamConfig::load(file.path()).unwrap();
        assert_eq!(config.blacklisted_keywords, vec!["timeshare".to_string()]);
        assert_eq!(config.max_links, 5);
        assert!(config.disposable_domains.iter().any(|d| d == "yopmail.com"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SpamConfig::load("/nonexistent/spam.yaml");
        assert!(matches!(result, Err(SpamConfigError::FileNotFound(..))));
    }
}
