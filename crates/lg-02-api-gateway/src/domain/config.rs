//! Gateway configuration with validation.

use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Public HTTP server
    pub http: HttpConfig,
    /// Admin server (localhost only by default)
    pub admin: AdminConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Fixed headers added to every response, in order
    pub headers: Vec<HeaderEntry>,
    /// Node lifecycle timing
    pub lifecycle: LifecycleConfig,
    /// Request limits
    pub limits: LimitsConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Port 0 asks the OS for a free port, so it never collides.
        if self.admin.enabled
            && self.http.port != 0
            && self.http.port == self.admin.port
            && self.http.host == self.admin.host
        {
            return Err(ConfigError::DuplicatePorts);
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }

        for entry in &self.headers {
            entry.parse()?;
        }

        self.cors.validate()
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Get Admin server bind address
    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.admin.host, self.admin.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

/// Admin server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address (localhost only by default)
    pub host: IpAddr,
    /// Port (default: 9090)
    pub port: u16,
    /// Enable admin server
    pub enabled: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 9090,
            enabled: true,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers ("*" for all)
    pub allowed_headers: Vec<String>,
    /// Expose headers
    pub expose_headers: Vec<String>,
    /// Max age for preflight cache, in seconds
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["*".to_string()],
            expose_headers: vec![],
            max_age: 86400,
        }
    }
}

impl CorsConfig {
    pub(crate) fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    pub(crate) fn allows_any_header(&self) -> bool {
        self.allowed_headers.iter().any(|h| h == "*")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if !self.allows_any_origin() {
            for origin in &self.allowed_origins {
                HeaderValue::from_str(origin)
                    .map_err(|_| ConfigError::InvalidCors(format!("origin {:?}", origin)))?;
            }
        }
        for method in &self.allowed_methods {
            Method::from_bytes(method.as_bytes())
                .map_err(|_| ConfigError::InvalidCors(format!("method {:?}", method)))?;
        }
        let named_headers = self
            .allowed_headers
            .iter()
            .filter(|h| *h != "*")
            .chain(&self.expose_headers);
        for header in named_headers {
            HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| ConfigError::InvalidCors(format!("header {:?}", header)))?;
        }
        Ok(())
    }
}

/// A fixed response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Convert to a typed header pair, rejecting illegal names or values.
    pub fn parse(&self) -> Result<(HeaderName, HeaderValue), ConfigError> {
        let name = HeaderName::from_bytes(self.name.as_bytes()).map_err(|e| {
            ConfigError::InvalidHeader {
                name: self.name.clone(),
                reason: e.to_string(),
            }
        })?;
        let value = HeaderValue::from_str(&self.value).map_err(|e| ConfigError::InvalidHeader {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;
        Ok((name, value))
    }
}

/// Node lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Delay before the backing index is first contacted; `0s` disables it
    #[serde(with = "humantime_serde")]
    pub warmup_delay: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            warmup_delay: Duration::from_secs(5),
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 1MB)
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 1024 * 1024,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// HTTP and admin servers bound to the same address
    #[error("duplicate ports configured")]
    DuplicatePorts,
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Illegal custom response header
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
    /// Unparseable CORS setting
    #[error("invalid CORS setting: {0}")]
    InvalidCors(String),
    /// Unparseable duration string
    #[error("invalid duration {0:?}")]
    InvalidDuration(String),
}

/// Parse `500ms`, `5s`, `2m` or plain seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());

    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| invalid())
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| invalid())
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
            .ok_or_else(invalid)
    } else {
        s.parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    }
}

/// Serde adapter for `Duration` fields written as `5s` / `500ms`.
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
