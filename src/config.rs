use config::ConfigError;
use solana_client::rpc_config::CommitmentConfig;
use std::{str::FromStr, time::Duration};

use crate::reclaim::pacing::MAX_DELAY_SECS;

/// Largest close set that still fits a single 1232-byte transaction packet.
pub const MAX_BATCH_SIZE: usize = 27;

#[derive(Debug, Clone)]
pub struct Config {
    pub solana_rpc_url: String,
    pub keys_file: String,
    pub batch_size: usize,
    pub delay_from: u64,
    pub delay_to: u64,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub confirm_poll_interval: Duration,
    pub commitment: CommitmentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            keys_file: "keys.txt".to_string(),
            batch_size: 20,
            delay_from: 20,
            delay_to: 180,
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            confirm_poll_interval: Duration::from_millis(1000),
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source, falling back to
    /// defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let commitment = match lookup("COMMITMENT") {
            Some(level) => CommitmentConfig::from_str(level.trim()).map_err(|_| {
                ConfigError::Message(format!("COMMITMENT: unknown level '{}'", level))
            })?,
            None => defaults.commitment,
        };

        let config = Self {
            solana_rpc_url: lookup("SOLANA_RPC_URL").unwrap_or(defaults.solana_rpc_url),
            keys_file: lookup("KEYS_FILE").unwrap_or(defaults.keys_file),
            batch_size: parse_var(&lookup, "BATCH_SIZE", defaults.batch_size)?,
            delay_from: parse_var(&lookup, "DELAY_FROM", defaults.delay_from)?,
            delay_to: parse_var(&lookup, "DELAY_TO", defaults.delay_to)?,
            max_attempts: parse_var(&lookup, "MAX_ATTEMPTS", defaults.max_attempts)?,
            retry_delay: Duration::from_secs(parse_var(
                &lookup,
                "RETRY_DELAY_SECS",
                defaults.retry_delay.as_secs(),
            )?),
            confirm_poll_interval: Duration::from_millis(parse_var(
                &lookup,
                "CONFIRM_POLL_MS",
                defaults.confirm_poll_interval.as_millis() as u64,
            )?),
            commitment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Message(format!(
                "BATCH_SIZE must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::Message(
                "MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.delay_to > MAX_DELAY_SECS {
            return Err(ConfigError::Message(format!(
                "DELAY_TO must not exceed {} seconds, got {}",
                MAX_DELAY_SECS, self.delay_to
            )));
        }

        if self.delay_from > self.delay_to {
            return Err(ConfigError::Message(format!(
                "DELAY_FROM ({}) must not exceed DELAY_TO ({})",
                self.delay_from, self.delay_to
            )));
        }

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::Message(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}
