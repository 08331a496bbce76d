//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::persistence;
use crate::{ConfigError, IntakeConfig, ScoringConfig, SpamConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Submission windows and limits
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Spam heuristics
    #[serde(default)]
    pub spam: SpamConfig,

    /// Standalone spam list file; replaces the `spam` section when set
    #[serde(default)]
    pub spam_file: Option<PathBuf>,

    /// Benchmark fallbacks and insight sizes
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Persistence configuration (ScyllaDB)
    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    /// ScyllaDB host addresses
    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    /// ScyllaDB keyspace name
    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    /// ScyllaDB replication factor
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec![persistence::DEFAULT_HOST.to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| persistence::DEFAULT_KEYSPACE.to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the spam section with the contents of `spam_file`, if any
    pub fn apply_spam_file(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = &self.spam_file {
            self.spam = SpamConfig::load(path)?;
            tracing::debug!(path = %path.display(), "Loaded spam lists");
        }
        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_intake()?;
        self.validate_spam()?;
        self.validate_scoring()?;
        self.validate_persistence()?;
        Ok(())
    }

    fn validate_intake(&self) -> Result<(), ConfigError> {
        let intake = &self.intake;

        if intake.dedupe_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intake.dedupe_window_secs".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        if intake.rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intake.rate_limit_window_secs".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        if intake.rate_limit_max == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intake.rate_limit_max".to_string(),
                message: "Must allow at least 1 submission".to_string(),
            });
        }

        if intake.rate_limit_window_secs > intake.dedupe_window_secs {
            if self.environment.is_strict() {
                return Err(ConfigError::InvalidValue {
                    field: "intake.rate_limit_window_secs".to_string(),
                    message: format!(
                        "Must not exceed intake.dedupe_window_secs ({})",
                        intake.dedupe_window_secs
                    ),
                });
            }
            tracing::warn!(
                "intake.rate_limit_window_secs ({}) exceeds dedupe_window_secs ({}); \
                 repeat submissions will be merged before they can count towards the limit",
                intake.rate_limit_window_secs,
                intake.dedupe_window_secs
            );
        }

        Ok(())
    }

    fn validate_spam(&self) -> Result<(), ConfigError> {
        let spam = &self.spam;

        if !(0.0..=1.0).contains(&spam.uppercase_ratio) {
            return Err(ConfigError::InvalidValue {
                field: "spam.uppercase_ratio".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", spam.uppercase_ratio),
            });
        }

        if spam.max_repeated_chars < 2 {
            return Err(ConfigError::InvalidValue {
                field: "spam.max_repeated_chars".to_string(),
                message: "Must be at least 2".to_string(),
            });
        }

        Ok(())
    }

    fn validate_scoring(&self) -> Result<(), ConfigError> {
        let scoring = &self.scoring;

        let defaults = [
            ("scoring.default_avg_deal_value", scoring.default_avg_deal_value),
            ("scoring.default_avg_activities", scoring.default_avg_activities),
            (
                "scoring.default_avg_days_to_close",
                scoring.default_avg_days_to_close,
            ),
        ];
        for (field, value) in defaults {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be positive, got {}", value),
                });
            }
        }

        if scoring.insights_top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.insights_top_n".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_persistence(&self) -> Result<(), ConfigError> {
        let persistence = &self.persistence;
        if !persistence.enabled {
            return Ok(());
        }

        if persistence.keyspace.trim().is_empty() {
            return Err(ConfigError::MissingField("persistence.keyspace".to_string()));
        }

        if persistence.scylla_hosts.is_empty() {
            return Err(ConfigError::MissingField(
                "persistence.scylla_hosts".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority: env vars (`LEADFLOW__SECTION__KEY`) > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("LEADFLOW")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    settings.apply_spam_file()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.intake.rate_limit_max, 3);
        assert_eq!(settings.intake.rate_limit_window_secs, 300);
        assert!(!settings.persistence.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_intake_validation() {
        let mut settings = Settings::default();
        settings.intake.rate_limit_max = 0;
        assert!(settings.validate().is_err());

        settings.intake.rate_limit_max = 5;
        assert!(settings.validate().is_ok());

        settings.intake.dedupe_window_secs = 0;
        assert!(settings.validate_intake().is_err());
    }

    #[test]
    fn test_spam_ratio_validation() {
        let mut settings = Settings::default();
        settings.spam.uppercase_ratio = 1.5;
        assert!(settings.validate_spam().is_err());

        settings.spam.uppercase_ratio = 0.8;
        assert!(settings.validate_spam().is_ok());
    }

    #[test]
    fn test_scoring_defaults_must_be_positive() {
        let mut settings = Settings::default();
        settings.scoring.default_avg_days_to_close = 0.0;
        assert!(settings.validate_scoring().is_err());

        settings.scoring.default_avg_days_to_close = f64::NAN;
        assert!(settings.validate_scoring().is_err());
    }

    #[test]
    fn test_persistence_validation_only_when_enabled() {
        let mut settings = Settings::default();
        settings.persistence.keyspace = String::new();
        assert!(settings.validate_persistence().is_ok());

        settings.persistence.enabled = true;
        assert!(settings.validate_persistence().is_err());
    }

    #[test]
    fn test_environment_flags() {
        assert!(RuntimeEnvironment::Production.is_strict());
        assert!(RuntimeEnvironment::Staging.is_strict());
        assert!(!RuntimeEnvironment::Development.is_strict());
    }

    #[test]
    fn test_window_mismatch_rejected_in_strict_environments() {
        let mut settings = Settings::default();
        settings.intake.dedupe_window_secs = 60;
        settings.intake.rate_limit_window_secs = 600;
        assert!(settings.validate().is_ok());

        for environment in [RuntimeEnvironment::Staging, RuntimeEnvironment::Production] {
            settings.environment = environment;
            match settings.validate() {
                Err(ConfigError::InvalidValue { field, .. }) => {
                    assert_eq!(field, "intake.rate_limit_window_secs")
                }
                other => panic!("expected window error, got {:?}", other),
            }
        }

        settings.intake.rate_limit_window_secs = 60;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_spam_file_replaces_section() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "disposable_domains: [\"junk.example\"]").unwrap();
        writeln!(file, "max_repeated_chars: 4").unwrap();

        let mut settings = Settings::default();
        settings.apply_spam_file().unwrap();
        assert_eq!(settings.spam.max_repeated_chars, SpamConfig::default().max_repeated_chars);

        settings.spam_file = Some(file.path().to_path_buf());
        settings.apply_spam_file().unwrap();
        assert_eq!(settings.spam.disposable_domains, vec!["junk.example".to_string()]);
        assert_eq!(settings.spam.max_repeated_chars, 4);

        settings.spam_file = Some(PathBuf::from("/nonexistent/spam.yaml"));
        assert!(matches!(
            settings.apply_spam_file(),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
