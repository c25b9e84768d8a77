//! Configuration loading and constants.
//!
//! Settings are resolved once at startup from built-in defaults, an optional
//! TOML file, and environment variables (in increasing order of precedence).
//! `AppConfig` is the root struct handed to the rest of the application.

use const_format::formatcp;
use serde::Deserialize;
use std::env::VarError;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Greeting returned by `GET /` when no message is configured
pub const DEFAULT_MESSAGE: &str = "Hello from Kubernetes!";

/// Seconds after startup before `/ready` reports ready
pub const DEFAULT_READY_DELAY_SECS: i64 = 5;

/// Listen on all interfaces by default
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8080;

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "kube_hello=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Seconds to wait for in-flight requests after a shutdown signal
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

// =============================================================================
// HTTP Response Headers
// =============================================================================

/// Probe and metrics responses must never be served from a cache
pub const CACHE_CONTROL_PROBE: &str = "no-store";

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_MESSAGE: &str = "APP_MESSAGE";
pub const ENV_READY_DELAY: &str = "READY_DELAY_SECONDS";
pub const ENV_HOST: &str = "APP_HOST";
pub const ENV_PORT: &str = "APP_PORT";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Shown in `--help` so operators can find the environment knobs
pub const ENV_HELP: &str = formatcp!(
    "Environment: {}, {}, {}, {}, {}, RUST_LOG",
    ENV_MESSAGE,
    ENV_READY_DELAY,
    ENV_HOST,
    ENV_PORT,
    ENV_LOG_FORMAT
);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Greeting and readiness settings
    #[serde(default)]
    pub app: AppSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Text returned in the greeting body
    #[serde(default = "AppSettings::default_message")]
    pub message: String,
    /// Delay after startup before the instance reports ready; negative means none
    #[serde(default = "AppSettings::default_ready_delay")]
    pub ready_delay_seconds: i64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            message: Self::default_message(),
            ready_delay_seconds: Self::default_ready_delay(),
        }
    }
}

impl AppSettings {
    fn default_message() -> String {
        DEFAULT_MESSAGE.to_string()
    }

    fn default_ready_delay() -> i64 {
        DEFAULT_READY_DELAY_SECS
    }

    /// Configured delay, with negative values clamped to zero.
    pub fn ready_delay(&self) -> Duration {
        Duration::from_secs(self.ready_delay_seconds.max(0) as u64)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl AppConfig {
    /// Load configuration for the running process.
    ///
    /// Reads the TOML file when a path is given, then applies the process
    /// environment on top.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env(|key| std::env::var(key))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// `lookup` has the signature of [`std::env::var`]. Values that are not
    /// valid Unicode, and integer settings that fail to parse, are rejected
    /// instead of falling back to their defaults.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        if let Some(message) = read_var(&lookup, ENV_MESSAGE)? {
            self.app.message = message;
        }
        if let Some(raw) = read_var(&lookup, ENV_READY_DELAY)? {
            self.app.ready_delay_seconds = parse_integer(ENV_READY_DELAY, &raw)?;
        }
        if let Some(host) = read_var(&lookup, ENV_HOST)? {
            self.http.host = host;
        }
        if let Some(raw) = read_var(&lookup, ENV_PORT)? {
            self.http.port = parse_integer(ENV_PORT, &raw)?;
        }
        if let Some(format) = read_var(&lookup, ENV_LOG_FORMAT)? {
            self.logging.format = format;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }

    /// Listener address. The host must be an IPv4 or IPv6 literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .http
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost {
                value: self.http.host.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.http.port))
    }
}

fn read_var<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::NotUnicode {
            key,
            value: raw.to_string_lossy().into_owned(),
        }),
    }
}

fn parse_integer<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidInteger {
            key,
            value: raw.to_string(),
        })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{key} must be an integer, got {value:?}")]
    InvalidInteger { key: &'static str, value: String },
    #[error("{key} is not valid Unicode: {value:?}")]
    NotUnicode { key: &'static str, value: String },
    #[error("http host {value:?} is not an IP address: {source}")]
    InvalidHost {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("Unknown log format {0:?} (expected \"text\" or \"json\")")]
    InvalidLogFormat(String),
}
