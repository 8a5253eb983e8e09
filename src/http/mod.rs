//! HTTP server module.
//!
//! The server includes:
//! - A lifecycle state machine (Created, Starting, Listening, Draining, Stopped)
//! - One task per accepted connection
//! - Graceful shutdown on SIGTERM/SIGINT bounded by a grace period

mod lifecycle;
mod server;
mod shutdown;

pub use lifecycle::{ServerState, StateTracker, TransitionError};
pub use server::{HealthServer, ServerError, ServerHandle};
pub use shutdown::{shutdown_signal, ShutdownSignal};

use std::future::Future;

use crate::config::ServerConfig;

/// Serve until `signal` resolves, then shut down gracefully.
pub async fn run_until<F>(config: ServerConfig, signal: F) -> Result<(), ServerError>
where
    F: Future,
{
    let handle = HealthServer::new(config).start().await?;
    signal.await;
    handle.stop().await
}
