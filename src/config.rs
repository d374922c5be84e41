//! Service configuration
//!
//! Loaded once at startup from environment variables. Every optional value
//! logs the default it falls back to; the platform signer is read from a
//! secret file, never from the environment itself.

use log::{info, warn};
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::{collections::HashSet, env, fmt::Display, str::FromStr};
use thiserror::Error;

use crate::{
    constants::{
        DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_KEY_PREFIX, DEFAULT_NAME_LOCK_WINDOW_SECS,
        DEFAULT_PENDING_PROJECT_TTL_SECS, DEFAULT_RESERVATION_TTL_SECS, DEFAULT_RPC_URL,
        DEFAULT_SWEEP_INTERVAL_SECS,
    },
    processors::ServiceSettings,
    types::PlatformSettings,
    utils::RateLimit,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(String),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Failed to read secret {path}: {reason}")]
    Secret { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub key_prefix: String,
    pub rpc_url: String,
    pub platform_keypair_path: String,
    pub launchpad_program_id: Pubkey,
    pub platform_config: Pubkey,
    pub platform_name: String,
    pub reservation_ttl_secs: i64,
    pub pending_project_ttl_secs: i64,
    pub name_lock_window_secs: i64,
    pub sweep_interval_secs: u64,
    pub confirm_timeout_secs: u64,
    pub prepare_limit: RateLimit,
    pub submit_limit: RateLimit,
    pub compute_unit_limit: u32,
    pub compute_unit_price_micro_lamports: u64,
    pub admin_wallets: HashSet<Pubkey>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };
        let rate_window = source.try_load("RATE_LIMIT_WINDOW_SECS", "60")?;

        Ok(Self {
            port: source.try_load("LAUNCHPAD_PORT", "8080")?,
            redis_url: source.try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            key_prefix: source.try_load("MINTPOOL_KEY_PREFIX", DEFAULT_KEY_PREFIX)?,
            rpc_url: source.try_load("SOLANA_RPC_URL", DEFAULT_RPC_URL)?,
            platform_keypair_path: source.try_load("PLATFORM_KEYPAIR_PATH", "/run/secrets/platform_keypair.json")?,
            launchpad_program_id: source.require("LAUNCHPAD_PROGRAM_ID")?,
            platform_config: source.require("PLATFORM_CONFIG_ACCOUNT")?,
            platform_name: source.try_load("PLATFORM_NAME", "Launchpad")?,
            reservation_ttl_secs: source.try_load("RESERVATION_TTL_SECS", &DEFAULT_RESERVATION_TTL_SECS.to_string())?,
            pending_project_ttl_secs: source
                .try_load("PENDING_PROJECT_TTL_SECS", &DEFAULT_PENDING_PROJECT_TTL_SECS.to_string())?,
            name_lock_window_secs: source.try_load("NAME_LOCK_WINDOW_SECS", &DEFAULT_NAME_LOCK_WINDOW_SECS.to_string())?,
            sweep_interval_secs: source.try_load("SWEEP_INTERVAL_SECS", &DEFAULT_SWEEP_INTERVAL_SECS.to_string())?,
            confirm_timeout_secs: source.try_load("CONFIRM_TIMEOUT_SECS", "60")?,
            prepare_limit: RateLimit {
                max_requests: source.try_load("PREPARE_RATE_LIMIT", "10")?,
                window_secs: rate_window,
            },
            submit_limit: RateLimit {
                max_requests: source.try_load("SUBMIT_RATE_LIMIT", "20")?,
                window_secs: rate_window,
            },
            compute_unit_limit: source.try_load("COMPUTE_UNIT_LIMIT", &DEFAULT_COMPUTE_UNIT_LIMIT.to_string())?,
            compute_unit_price_micro_lamports: source.try_load("COMPUTE_UNIT_PRICE", "0")?,
            admin_wallets: source.pubkey_list("ADMIN_WALLETS")?,
        })
    }

    /// Reads the platform authority keypair from its secret file.
    pub fn load_platform_signer(&self) -> Result<Keypair, ConfigError> {
        read_keypair_file(&self.platform_keypair_path).map_err(|e| ConfigError::Secret {
            path: self.platform_keypair_path.clone(),
            reason: e.to_string(),
        })
    }

    pub fn platform_settings(&self) -> PlatformSettings {
        PlatformSettings {
            launchpad_program_id: self.launchpad_program_id,
            platform_config: self.platform_config,
            platform_name: self.platform_name.clone(),
            compute_unit_limit: self.compute_unit_limit,
            compute_unit_price_micro_lamports: self.compute_unit_price_micro_lamports,
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            platform: self.platform_settings(),
            reservation_ttl_secs: self.reservation_ttl_secs,
            pending_project_ttl_secs: self.pending_project_ttl_secs,
            name_lock_window_secs: self.name_lock_window_secs,
            prepare_limit: self.prepare_limit,
            submit_limit: self.submit_limit,
        }
    }
}

struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
    where
        T::Err: Display,
    {
        raw.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn try_load<T: FromStr>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T::Err: Display,
    {
        let raw = (self.lookup)(key).unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        });
        Self::parse(key, &raw)
    }

    fn require<T: FromStr>(&self, key: &str) -> Result<T, ConfigError>
    where
        T::Err: Display,
    {
        let raw = (self.lookup)(key).ok_or_else(|| ConfigError::Missing(key.to_string()))?;
        Self::parse(key, &raw)
    }

    fn pubkey_list(&self, key: &str) -> Result<HashSet<Pubkey>, ConfigError> {
        let Some(raw) = (self.lookup)(key) else {
            warn!("{key} not set, admin endpoints are disabled");
            return Ok(HashSet::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self::parse::<Pubkey>(key, s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_and_required() {
        let program = Pubkey::new_unique();
        let platform_config = Pubkey::new_unique();
        let config = Config::from_lookup(lookup(&[
            ("LAUNCHPAD_PROGRAM_ID", program.to_string()),
            ("PLATFORM_CONFIG_ACCOUNT", platform_config.to_string()),
        ]))
        .unwrap();

        assert_eq!(config.launchpad_program_id, program);
        assert_eq!(config.reservation_ttl_secs, DEFAULT_RESERVATION_TTL_SECS);
        assert_eq!(config.pending_project_ttl_secs, DEFAULT_PENDING_PROJECT_TTL_SECS);
        assert_eq!(config.prepare_limit, RateLimit { max_requests: 10, window_secs: 60 });
        assert!(config.admin_wallets.is_empty());

        let missing = Config::from_lookup(lookup(&[("LAUNCHPAD_PROGRAM_ID", program.to_string())]));
        assert_eq!(missing, Err(ConfigError::Missing("PLATFORM_CONFIG_ACCOUNT".into())));
    }

    #[test]
    fn test_invalid_values() {
        let admin = Pubkey::new_unique();
        let base = [
            ("LAUNCHPAD_PROGRAM_ID", Pubkey::new_unique().to_string()),
            ("PLATFORM_CONFIG_ACCOUNT", Pubkey::new_unique().to_string()),
            ("ADMIN_WALLETS", format!("{}, ", admin)),
        ];
        let config = Config::from_lookup(lookup(&base)).unwrap();
        assert!(config.admin_wallets.contains(&admin));

        let mut bad = base.to_vec();
        bad.push(("RESERVATION_TTL_SECS", "soon".into()));
        assert!(matches!(Config::from_lookup(lookup(&bad)), Err(ConfigError::Invalid { key, .. }) if key == "RESERVATION_TTL_SECS"));
    }
}
