//! Configuration management for lead intake and scoring
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (LEADFLOW__ prefix)
//! - Standalone spam list files (see [`SpamConfig::load`])

pub mod constants;
pub mod intake;
pub mod scoring;
pub mod settings;
pub mod spam;

pub use intake::{FieldLimits, IntakeConfig};
pub use scoring::ScoringConfig;
pub use settings::{
    load_settings, ObservabilityConfig, PersistenceConfig, RuntimeEnvironment, Settings,
};
pub use spam::{SpamConfig, SpamConfigError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<SpamConfigError> for ConfigError {
    fn from(err: SpamConfigError) -> Self {
        match err {
            SpamConfigError::FileNotFound(path, _) => ConfigError::FileNotFound(path),
            SpamConfigError::ParseError(msg) => ConfigError::ParseError(msg),
        }
    }
}
