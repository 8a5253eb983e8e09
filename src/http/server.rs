//! HTTP server startup and shutdown.
//!
//! `HealthServer::start` binds the listener and returns once it accepts
//! connections. Each accepted connection is served on its own task.
//! `ServerHandle::stop` closes the listener, lets in-flight requests finish
//! within the grace period, then force-closes whatever is left.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::middleware::duration_ms;
use crate::routes::{build_router, create_router};

use super::lifecycle::{ServerState, StateTracker, TransitionError};

/// Server startup and shutdown error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),

    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// A configured server that has not been started yet.
pub struct HealthServer {
    config: ServerConfig,
    app: Router,
    state: StateTracker,
}

impl HealthServer {
    /// Server answering only `GET /healthz`.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            app: create_router(),
            state: StateTracker::new(),
        }
    }

    /// Server with `extra` routes merged next to the health endpoint.
    pub fn with_routes(config: ServerConfig, extra: Router) -> Self {
        Self {
            config,
            app: build_router(extra),
            state: StateTracker::new(),
        }
    }

    /// Configuration the server will bind with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Current lifecycle state; `Created` until `start` is called.
    pub fn state(&self) -> ServerState {
        self.state.current()
    }

    /// Bind the listener and start serving.
    ///
    /// Returns once the socket accepts connections. A bind failure is
    /// reported once as [`ServerError::Bind`]; it is never retried.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let Self { config, app, state } = self;
        let addr = config.socket_addr();

        state.advance(ServerState::Starting)?;
        tracing::info!(%addr, "Starting HTTP server");

        let handle = Handle::new();
        let server = axum_server::bind(addr).handle(handle.clone());
        let task = tokio::spawn(async move { server.serve(app.into_make_service()).await });

        match handle.listening().await {
            Some(local_addr) => {
                state.advance(ServerState::Listening)?;
                tracing::info!(%local_addr, "Listening for connections");
                Ok(ServerHandle {
                    local_addr,
                    grace_period: config.shutdown_grace_period(),
                    handle,
                    state,
                    task: Some(task),
                })
            }
            None => {
                let source = match task.await {
                    Ok(Err(e)) => e,
                    Ok(Ok(())) => io::Error::new(
                        io::ErrorKind::Other,
                        "server exited before it started listening",
                    ),
                    Err(e) => io::Error::new(io::ErrorKind::Other, e.to_string()),
                };
                state.advance(ServerState::Stopped)?;
                tracing::error!(%addr, error = %source, "Failed to bind server");
                Err(ServerError::Bind { addr, source })
            }
        }
    }
}

/// A running server.
///
/// Call [`ServerHandle::stop`] for a graceful shutdown. Dropping the handle
/// without stopping closes the listener and every connection immediately.
pub struct ServerHandle {
    local_addr: SocketAddr,
    grace_period: Duration,
    handle: Handle,
    state: StateTracker,
    task: Option<JoinHandle<io::Result<()>>>,
}

impl ServerHandle {
    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        self.state.current()
    }

    /// Receiver that observes every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Number of currently open client connections.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    /// Stop accepting, drain in-flight requests for up to the grace period,
    /// then close everything.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        let local_addr = self.local_addr;
        let grace_period = self.grace_period;

        self.state.advance(ServerState::Draining)?;
        self.handle.graceful_shutdown(Some(grace_period));
        tracing::info!(
            %local_addr,
            grace_period_ms = duration_ms(grace_period),
            in_flight = self.handle.connection_count(),
            "Graceful shutdown initiated, waiting for connections to close"
        );

        let result = match self.task.take() {
            Some(task) => task.await,
            None => Ok(Ok(())),
        };
        self.state.advance(ServerState::Stopped)?;
        tracing::info!(%local_addr, "Server stopped");

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ServerError::Serve(e)),
            Err(e) => Err(ServerError::Task(e)),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        // Still serving: nobody called stop()
        if self.task.take().is_some() {
            tracing::warn!(
                local_addr = %self.local_addr,
                "Server handle dropped without stop, shutting down immediately"
            );
            self.handle.shutdown();
        }
    }
}
