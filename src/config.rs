//! Configuration capture and constants.
//!
//! The process environment is read exactly once at startup into a
//! [`ServerConfig`] and a [`LoggingConfig`]. Everything downstream receives
//! those values explicitly; nothing else in the crate touches `std::env`.
//!
//! A `.env` file in the working directory (or any parent) is merged into the
//! environment first. Variables already set in the real environment win.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Port used when `PORT` is unset or empty
pub const DEFAULT_PORT: u16 = 8080;

/// Listen on all interfaces by default
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Time in-flight requests get to finish after a shutdown signal
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "healthd=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "HOST";
pub const ENV_SHUTDOWN_GRACE: &str = "SHUTDOWN_GRACE_PERIOD_SECS";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_LOG_FILTER: &str = "RUST_LOG";

/// File merged into the environment before configuration is captured
pub const DOTENV_FILE: &str = ".env";

// =============================================================================
// Routes
// =============================================================================

/// Path of the liveness endpoint
pub const HEALTH_PATH: &str = "/healthz";

/// Response header carrying the per-request UUID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Merge the nearest `.env` file into the process environment.
///
/// Returns the path that was loaded, or `None` when there is no file.
/// Variables already present in the environment are left untouched.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::Dotenv(e)),
    }
}

/// Merge a specific env file into the process environment.
///
/// A missing file is not an error. Existing variables are left untouched.
pub fn load_dotenv_from<P: AsRef<Path>>(path: P) -> Result<Option<PathBuf>, ConfigError> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::Dotenv(e)),
    }
}

/// HTTP server configuration.
///
/// Fields are private so a constructed value always holds a usable port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    host: IpAddr,
    port: u16,
    shutdown_grace_period: Duration,
}

impl ServerConfig {
    /// Build a config listening on `port` with default host and grace period.
    pub fn new(port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            host: DEFAULT_HOST,
            port: validate_port(port)?,
            shutdown_grace_period: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        })
    }

    /// Capture the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture the configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset, so `PORT=` falls back to the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get(ENV_PORT) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };

        let host = match get(ENV_HOST) {
            Some(raw) => IpAddr::from_str(raw.trim())
                .map_err(|_| ConfigError::InvalidHost(raw.clone()))?,
            None => DEFAULT_HOST,
        };

        let grace_secs = match get(ENV_SHUTDOWN_GRACE) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidGracePeriod(raw.clone()))?,
            None => DEFAULT_SHUTDOWN_GRACE_SECS,
        };

        Ok(Self {
            host,
            port,
            shutdown_grace_period: Duration::from_secs(grace_secs),
        })
    }

    /// Replace the port, rejecting `0`.
    pub fn with_port(mut self, port: u16) -> Result<Self, ConfigError> {
        self.port = validate_port(port)?;
        Ok(self)
    }

    /// Replace the bind address.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Replace how long in-flight requests get to finish on shutdown.
    pub fn with_shutdown_grace_period(mut self, grace: Duration) -> Self {
        self.shutdown_grace_period = grace;
        self
    }

    /// IP address the listener binds to
    pub fn host(&self) -> IpAddr {
        self.host
    }

    /// TCP port, always in 1..=65535
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Time in-flight requests get to finish after a shutdown signal
    pub fn shutdown_grace_period(&self) -> Duration {
        self.shutdown_grace_period
    }

    /// Address the listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            shutdown_grace_period: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let port = raw
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;
    validate_port(port)
}

fn validate_port(port: u16) -> Result<u16, ConfigError> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port.to_string()));
    }
    Ok(port)
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Capture the log format from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture the log format from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(ENV_LOG_FORMAT)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string());
        Ok(Self {
            format: raw.parse()?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port {0:?}: expected an integer between 1 and 65535")]
    InvalidPort(String),
    #[error("Invalid host {0:?}: expected an IP address")]
    InvalidHost(String),
    #[error("Invalid shutdown grace period {0:?}: expected whole seconds")]
    InvalidGracePeriod(String),
    #[error("Invalid log format {0:?}: expected \"text\" or \"json\"")]
    InvalidLogFormat(String),
    #[error("Failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}
