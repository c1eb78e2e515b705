//! Ledger client configuration.
//!
//! Defaults point to a node on the local machine. Override via environment
//! variables or explicit construction for staging and tests.

use url::Url;

/// Default ledger node address.
pub const DEFAULT_LEDGER_URL: &str = "http://127.0.0.1:7876";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to a ledger node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Base URL of the ledger node's HTTP API.
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `APX_LEDGER_URL` (default: `http://127.0.0.1:7876`)
    /// - `APX_LEDGER_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("APX_LEDGER_URL", DEFAULT_LEDGER_URL)?,
            timeout_secs: env_timeout("APX_LEDGER_TIMEOUT_SECS")?,
        })
    }

    /// Build a configuration from an explicit URL string.
    pub fn with_url(raw: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("base_url", raw)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Create a configuration pointing to a local mock server (for testing).
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("localhost", &format!("http://127.0.0.1:{port}"))?,
            timeout_secs: 5,
        })
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn env_timeout(var: &str) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidTimeout(var.to_string(), raw)),
            Ok(secs) => Ok(secs),
        },
        Err(_) => Ok(DEFAULT_TIMEOUT_SECS),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid timeout for {0}: {1:?} (expected a positive number of seconds)")]
    InvalidTimeout(String, String),
}
