// # signaged - Signage Configuration Daemon
//
// Thin integration layer: all validation, storage and distribution logic lives
// in signage-core, all HTTP concerns in signage-http.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Opening the config store
// 4. Serving the gateway until SIGTERM or SIGINT
//
// ## Configuration
//
// ### Server
// - `SIGNAGE_BIND_ADDR`: Listen address (default `0.0.0.0:8080`)
// - `SIGNAGE_REQUEST_TIMEOUT_SECS`: Per-request timeout, 1..=300 (default 10)
//
// ### Store
// - `SIGNAGE_STORE_TYPE`: `file` or `memory` (default `file`)
// - `SIGNAGE_STORE_PATH`: Snapshot file for the file store
//   (default `./signage-configs.json`)
//
// ### Access
// - `ADMIN_USER`: Shared basic-auth user (default `admin`)
// - `ADMIN_PASS`: Shared basic-auth password (default `1234`)
//
// ### Logging
// - `SIGNAGE_LOG_LEVEL`: trace, debug, info, warn or error (default `info`)
//
// ## Example
//
// ```bash
// export SIGNAGE_STORE_PATH=/var/lib/signage/configs.json
// export ADMIN_USER=ops
// export ADMIN_PASS=change-me
//
// signaged
// ```

use anyhow::{Context, Result};
use signage_core::{
    AccessConfig, DistributionGateway, ServerConfig, SignageConfig, StoreConfig, open_store,
};
use signage_http::HttpServer;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_STORE_PATH: &str = "./signage-configs.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
#[derive(Debug)]
struct Config {
    service: SignageConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server = ServerConfig {
            bind_address: lookup("SIGNAGE_BIND_ADDR")
                .unwrap_or_else(|| ServerConfig::default().bind_address),
            request_timeout_secs: match lookup("SIGNAGE_REQUEST_TIMEOUT_SECS") {
                Some(raw) => raw.trim().parse().with_context(|| {
                    format!("SIGNAGE_REQUEST_TIMEOUT_SECS must be a whole number. Got: {raw}")
                })?,
                None => ServerConfig::default().request_timeout_secs,
            },
        };

        let store_type = lookup("SIGNAGE_STORE_TYPE").unwrap_or_else(|| "file".to_string());
        let store = match store_type.to_lowercase().as_str() {
            "file" => StoreConfig::File {
                path: lookup("SIGNAGE_STORE_PATH")
                    .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string()),
            },
            "memory" => StoreConfig::Memory,
            _ => anyhow::bail!(
                "SIGNAGE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                store_type
            ),
        };

        let defaults = AccessConfig::default();
        let access = AccessConfig::new(
            lookup("ADMIN_USER").unwrap_or(defaults.username),
            lookup("ADMIN_PASS").unwrap_or(defaults.password),
        );

        Ok(Self {
            service: SignageConfig {
                server,
                store,
                access,
            },
            log_level: lookup("SIGNAGE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.service.validate()?;
        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "SIGNAGE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn uses_default_credentials(&self) -> bool {
        let defaults = AccessConfig::default();
        self.service.access.username == defaults.username
            && self.service.access.password == defaults.password
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting signaged daemon");
    info!(
        bind = %config.service.server.bind_address,
        store = config.service.store.type_name(),
        "Configuration loaded"
    );
    if config.uses_default_credentials() {
        warn!("ADMIN_USER / ADMIN_PASS not set; the default credential is in use");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(DaemonError::Startup(e)) => {
                error!("Startup error: {:#}", e);
                DaemonExitCode::ConfigError
            }
            Err(DaemonError::Runtime(e)) => {
                error!("Daemon error: {:#}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Failure phase, which decides the exit code
enum DaemonError {
    Startup(anyhow::Error),
    Runtime(anyhow::Error),
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<(), DaemonError> {
    let service = config.service;

    let store = open_store(&service.store)
        .await
        .context("Failed to open config store")
        .map_err(DaemonError::Startup)?;
    let gateway = DistributionGateway::new(store);

    let listener = tokio::net::TcpListener::bind(&service.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", service.server.bind_address))
        .map_err(DaemonError::Startup)?;

    let server = HttpServer::new(gateway, &service);
    server
        .run(listener, shutdown_signal())
        .await
        .context("HTTP server failed")
        .map_err(DaemonError::Runtime)?;

    info!("Shutting down daemon");
    Ok(())
}

/// Resolve once SIGTERM or SIGINT arrives
#[cfg(unix)]
async fn shutdown_signal() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to set up signal handlers: {}", e);
                // Fall back to Ctrl-C only
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to wait for CTRL-C: {}", e);
                }
                return;
            }
        };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Resolve once Ctrl-C arrives
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => error!("Failed to wait for CTRL-C: {}", e),
    }
}
