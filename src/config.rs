use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Environment variable holding the recompute interval in seconds.
const RECOMPUTE_INTERVAL_ENV: &str = "PODIUM_RECOMPUTE_INTERVAL_SECS";
/// Environment variable holding the HTTP listen address.
const LISTEN_ADDR_ENV: &str = "PODIUM_LISTEN_ADDR";
/// Environment variable holding the Postgres connection string.
const DATABASE_URL_ENV: &str = "DATABASE_URL";

const DEFAULT_RECOMPUTE_INTERVAL_SECS: u64 = 60;
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{RECOMPUTE_INTERVAL_ENV} must be a positive number of seconds, got {0:?}")]
    InvalidInterval(String),

    #[error("{LISTEN_ADDR_ENV} is not a valid socket address: {0}")]
    InvalidListenAddr(String),
}

/// Immutable runtime configuration, resolved once at startup.
///
/// Invalid values are rejected here, before any component starts.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub recompute_interval: Duration,
    pub listen_addr: SocketAddr,
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let recompute_interval = match env::var(RECOMPUTE_INTERVAL_ENV) {
            Ok(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidInterval(raw.clone()))?;
                if secs == 0 {
                    return Err(ConfigError::InvalidInterval(raw));
                }
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_RECOMPUTE_INTERVAL_SECS),
        };

        let listen_addr = env::var(LISTEN_ADDR_ENV)
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidListenAddr(format!("{}", e)))?;

        let database_url = env::var(DATABASE_URL_ENV).ok().filter(|s| !s.is_empty());

        info!(
            recompute_interval_secs = recompute_interval.as_secs(),
            listen_addr = %listen_addr,
            postgres = database_url.is_some(),
            "Resolved application configuration"
        );

        Ok(Self {
            recompute_interval,
            listen_addr,
            database_url,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recompute_interval: Duration::from_secs(DEFAULT_RECOMPUTE_INTERVAL_SECS),
            listen_addr: DEFAULT_LISTEN_ADDR.parse().unwrap(),
            database_url: None,
        }
    }
}
