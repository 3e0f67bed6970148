//! # Node Configuration
//!
//! Gateway settings plus the ledger backend the gateway indexes.
//!
//! ## Load Order
//!
//! 1. Built-in defaults
//! 2. JSON file named by `LG_CONFIG` (optional, every section optional)
//! 3. Environment overrides (`LG_HTTP_PORT`, `LG_WARMUP_DELAY`, ...)
//!
//! Later sources win. The result is validated before anything binds.

use gateway_telemetry::parse_flag;
use lg_01_ledger_index::SyncConfig;
use lg_02_api_gateway::domain::{humantime_serde, parse_duration, ConfigError as GatewayConfigError};
use lg_02_api_gateway::{GatewayConfig, HeaderEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "LG_CONFIG";

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP, admin, CORS, headers, lifecycle and limits.
    pub gateway: GatewayConfig,
    /// Ledger backend configuration.
    pub ledger: LedgerConfig,
}

/// Which ledger the index is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// Process-local ledger, lost on exit.
    #[default]
    Memory,
    /// JSON-lines file replayed on start.
    File,
}

impl std::str::FromStr for LedgerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    /// Ledger file, used by the `file` backend.
    pub path: PathBuf,
    /// Delay between synchronization passes.
    #[serde(with = "humantime_serde")]
    pub sync_interval: Duration,
    /// Records fetched per synchronization read.
    pub sync_batch_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            backend: LedgerBackend::Memory,
            path: PathBuf::from("./data/ledger.jsonl"),
            sync_interval: sync.interval,
            sync_batch_size: sync.batch_size,
        }
    }
}

impl LedgerConfig {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            interval: self.sync_interval,
            batch_size: self.sync_batch_size,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("unknown ledger backend {0:?} (expected memory or file)")]
    UnknownBackend(String),

    #[error("invalid ledger settings: {0}")]
    InvalidLedger(String),

    #[error(transparent)]
    Gateway(#[from] GatewayConfigError),
}

impl NodeConfig {
    /// Defaults, then `LG_CONFIG`, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|var| std::env::var(var).ok())
    }

    /// Same as [`NodeConfig::load`], reading variables through `env`.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match env(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing sections keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `LG_*` overrides. Unset variables leave the value alone.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(host) = env("LG_HTTP_HOST") {
            self.gateway.http.host = parse_var("LG_HTTP_HOST", &host)?;
        }
        if let Some(port) = env("LG_HTTP_PORT") {
            self.gateway.http.port = parse_var("LG_HTTP_PORT", &port)?;
        }
        if let Some(port) = env("LG_ADMIN_PORT") {
            self.gateway.admin.port = parse_var("LG_ADMIN_PORT", &port)?;
        }
        if let Some(enabled) = env("LG_ADMIN_ENABLED") {
            self.gateway.admin.enabled = parse_flag(&enabled);
        }
        if let Some(delay) = env("LG_WARMUP_DELAY") {
            self.gateway.lifecycle.warmup_delay =
                parse_duration(&delay).map_err(|e| invalid("LG_WARMUP_DELAY", e))?;
        }
        if let Some(headers) = env("LG_CUSTOM_HEADERS") {
            self.gateway.headers = parse_headers(&headers)?;
        }
        if let Some(backend) = env("LG_LEDGER_BACKEND") {
            self.ledger.backend = backend.parse()?;
        }
        if let Some(path) = env("LG_LEDGER_PATH") {
            self.ledger.path = PathBuf::from(path);
        }
        if let Some(interval) = env("LG_SYNC_INTERVAL") {
            self.ledger.sync_interval =
                parse_duration(&interval).map_err(|e| invalid("LG_SYNC_INTERVAL", e))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;

        if self.ledger.sync_interval.is_zero() {
            return Err(ConfigError::InvalidLedger(
                "sync_interval must be greater than zero".to_string(),
            ));
        }
        if self.ledger.sync_batch_size == 0 {
            return Err(ConfigError::InvalidLedger(
                "sync_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.ledger.backend == LedgerBackend::File && self.ledger.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidLedger(
                "the file backend needs a path".to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnv {
        var,
        reason: reason.to_string(),
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| invalid(var, e))
}

/// `{"X-Frame-Options": "DENY", ...}` into header entries.
///
/// A JSON object has no order on the wire, so entries come out sorted by name.
fn parse_headers(raw: &str) -> Result<Vec<HeaderEntry>, ConfigError> {
    let map: BTreeMap<String, String> =
        serde_json::from_str(raw).map_err(|e| invalid("LG_CUSTOM_HEADERS", e))?;
    Ok(map
        .into_iter()
        .map(|(name, value)| HeaderEntry::new(name, value))
        .collect())
}
