//! Leadflow command line entry point

mod commands;
mod input;

use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;

use leadflow_config::{load_settings, Settings};

use crate::commands::Stores;

#[derive(Parser)]
#[command(name = "leadflow", version)]
#[command(about = "Lead intake, scoring and pipeline insights")]
struct Cli {
    /// Configuration environment (loads config/{env} over config/default)
    #[arg(long, env = "LEADFLOW_ENV", global = true)]
    env: Option<String>,

    /// YAML file of spam lists and thresholds, replacing the configured ones
    #[arg(long, env = "LEADFLOW_SPAM_CONFIG", global = true)]
    spam_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a JSON Lines file of submissions through intake
    Ingest {
        #[arg(long)]
        tenant: String,

        /// One submission per line
        #[arg(long)]
        file: PathBuf,

        /// Activity log to attach to ingested leads, one event per line
        #[arg(long)]
        activities: Option<PathBuf>,

        /// Rescore and persist every lead of the tenant afterwards
        #[arg(long)]
        refresh: bool,
    },
    /// Score the tenant's leads, or a single lead
    Score {
        #[arg(long)]
        tenant: String,

        #[arg(long)]
        lead: Option<Uuid>,
    },
    /// Tenant-level rollup of open leads
    Insights {
        #[arg(long)]
        tenant: String,
    },
}

impl Command {
    fn tenant(&self) -> &str {
        match self {
            Self::Ingest { tenant, .. } | Self::Score { tenant, .. } | Self::Insights { tenant } => {
                tenant
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match load_settings(cli.env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration (env: {})",
                cli.env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };
    if let Some(path) = cli.spam_config.clone() {
        override_spam_file(&mut settings, path)?;
    }

    init_tracing(&settings);
    tracing::info!(
        environment = ?settings.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting leadflow"
    );

    let tenant = cli.command.tenant().trim().to_string();
    ensure!(!tenant.is_empty(), "--tenant must not be empty");

    let stores = Stores::open(&settings).await;
    match cli.command {
        Command::Ingest {
            file,
            activities,
            refresh,
            ..
        } => {
            let report = commands::ingest(
                &settings,
                &stores,
                &tenant,
                &file,
                activities.as_deref(),
                refresh,
            )
            .await?;
            print_json(&report)
        }
        Command::Score { lead, .. } => {
            print_json(&commands::score(&settings, &stores, &tenant, lead).await?)
        }
        Command::Insights { .. } => {
            print_json(&commands::insights(&settings, &stores, &tenant).await?)
        }
    }
}

/// Swap in a spam list file given on the command line
fn override_spam_file(settings: &mut Settings, path: PathBuf) -> Result<()> {
    settings.spam_file = Some(path);
    settings.apply_spam_file()?;
    settings.validate()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("leadflow={}", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_spam_config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "leadflow",
            "score",
            "--tenant",
            "t1",
            "--spam-config",
            "lists.yaml",
        ])
        .unwrap();
        assert_eq!(cli.spam_config, Some(PathBuf::from("lists.yaml")));
        assert_eq!(cli.command.tenant(), "t1");
    }

    #[test]
    fn test_override_spam_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "blacklisted_keywords: [\"timeshare\"]").unwrap();

        let mut settings = Settings::default();
        override_spam_file(&mut settings, file.path().to_path_buf()).unwrap();
        assert_eq!(settings.spam.blacklisted_keywords, vec!["timeshare".to_string()]);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "uppercase_ratio: 3.0").unwrap();
        assert!(override_spam_file(&mut settings, bad.path().to_path_buf()).is_err());

        let missing = PathBuf::from("/nonexistent/lists.yaml");
        assert!(override_spam_file(&mut Settings::default(), missing).is_err());
    }
}
