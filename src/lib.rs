//! healthd - a minimal HTTP health-check server
//!
//! Serves `GET /healthz` with `{"ok":true}` and a 404 for everything else,
//! handles each connection on its own task, and shuts down gracefully with a
//! bounded grace period.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

pub use config::{ConfigError, LogFormat, LoggingConfig, ServerConfig};
pub use error::AppError;
pub use http::{HealthServer, ServerError, ServerHandle, ServerState};
