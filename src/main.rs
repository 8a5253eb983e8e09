//! healthd: HTTP health-check server.
//!
//! This is the application entry point. It merges an optional `.env` file,
//! captures configuration from the environment (with CLI overrides),
//! initializes tracing, starts the server, and serves until SIGTERM/SIGINT
//! triggers a graceful shutdown.

use std::net::IpAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use healthd::config::{
    load_dotenv, ConfigError, LogFormat, LoggingConfig, ServerConfig, DEFAULT_LOG_FILTER,
    ENV_LOG_FILTER,
};
use healthd::http::{run_until, shutdown_signal};

/// healthd: A minimal HTTP health-check server
#[derive(Parser, Debug)]
#[command(name = "healthd", version, about)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<IpAddr>,

    /// Seconds in-flight requests get to finish on shutdown (overrides SHUTDOWN_GRACE_PERIOD_SECS)
    #[arg(long)]
    grace_period: Option<u64>,

    /// Log level filter (e.g., "healthd=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format: "text" or "json" (overrides LOG_FORMAT)
    #[arg(long)]
    log_format: Option<String>,
}

impl Args {
    /// Layer CLI overrides on top of the environment-derived config.
    fn apply(&self, mut config: ServerConfig) -> Result<ServerConfig, ConfigError> {
        if let Some(port) = self.port {
            config = config.with_port(port)?;
        }
        if let Some(host) = self.host {
            config = config.with_host(host);
        }
        if let Some(secs) = self.grace_period {
            config = config.with_shutdown_grace_period(Duration::from_secs(secs));
        }
        Ok(config)
    }

    fn logging(&self) -> Result<LoggingConfig, ConfigError> {
        match &self.log_format {
            Some(format) => Ok(LoggingConfig {
                format: format.parse()?,
            }),
            None => LoggingConfig::from_env(),
        }
    }
}

fn init_tracing(log_filter: &str, logging: &LoggingConfig) {
    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(log_filter));

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Merge .env before anything reads the environment; real variables win
    let dotenv = load_dotenv();

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .clone()
        .or_else(|| std::env::var(ENV_LOG_FILTER).ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let logging = match args.logging() {
        Ok(logging) => logging,
        Err(e) => {
            init_tracing(&log_filter, &LoggingConfig::default());
            tracing::error!(error = %e, "Invalid logging configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&log_filter, &logging);

    match dotenv {
        Ok(Some(path)) => tracing::info!(path = %path.display(), "Loaded environment file"),
        Ok(None) => tracing::debug!("No .env file found"),
        Err(e) => {
            tracing::error!(error = %e, "Invalid .env file");
            return ExitCode::FAILURE;
        }
    }

    // Capture configuration once; nothing downstream reads the environment
    let config = match ServerConfig::from_env().and_then(|config| args.apply(config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        host = %config.host(),
        port = config.port(),
        grace_period_secs = config.shutdown_grace_period().as_secs(),
        "Loaded configuration"
    );

    match run_until(config, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server terminated with a fatal error");
            ExitCode::FAILURE
        }
    }
}
