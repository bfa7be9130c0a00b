//! CLI command implementations.

pub mod queue;
pub mod reset;
pub mod sweep;

use std::sync::Arc;
use std::time::Duration;

use lumly_core::{KvStore, LimitConfig};
use lumly_core::config::{DEFAULT_COOLDOWN_MINUTES, DEFAULT_QUOTA};
use lumly_server::store::RedisStore;
use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
    #[error("invalid argument {0}: {1}")]
    InvalidArgument(&'static str, String),
    #[error(transparent)]
    Store(#[from] lumly_core::StoreError),
}

/// Connect to the production store using the same environment the server
/// reads, and return it with the effective quota/cooldown settings.
pub async fn connect() -> Result<(Arc<dyn KvStore>, LimitConfig), CliError> {
    dotenvy::dotenv().ok();

    let redis_url = std::env::var("LUMLY_REDIS_URL")
        .or_else(|_| std::env::var("REDIS_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("LUMLY_REDIS_URL"))?;

    let quota = parse_env_or("LUMLY_GENERATION_QUOTA", DEFAULT_QUOTA)?;
    let cooldown_minutes = parse_env_or("LUMLY_COOLDOWN_MINUTES", DEFAULT_COOLDOWN_MINUTES)?;
    let limits = LimitConfig::new(quota, chrono::Duration::minutes(cooldown_minutes));

    tracing::info!("Connecting to Redis...");
    let store = RedisStore::connect(&redis_url, Duration::from_secs(5)).await?;

    Ok((Arc::new(store), limits))
}

fn parse_env_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| CliError::InvalidEnvVar(key, e.to_string())),
    }
}
