//! `routebridge` -- routing-engine supervisor.
//!
//! Launches an external batch routing engine, translates its log into
//! typed progress events, and publishes them either to a terminal
//! progress bar (local mode) or to a remote peer over a WebSocket
//! session (`--serve`).

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routebridge_engine::config::{self, JobConfig};
use routebridge_engine::display::DisplayServer;

use routebridge_launcher::cli::Cli;
use routebridge_launcher::state::{AppState, SessionSlot};
use routebridge_launcher::{local, routes};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routebridge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // --- Configuration & discovery ---
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    if cli.debug {
        tracing::info!(
            interpreter = %config.interpreter.display(),
            archive = %config.engine_archive.display(),
            extra_args = ?config.extra_args,
            artifact = %config.artifact_path.display(),
            headless = config.headless,
            display = %config.display_address,
            "Assembled engine invocation",
        );
    }

    // --- Display server helper ---
    let display = if config.headless {
        let helper = match config::find_executable(&cli.display_helper) {
            Ok(helper) => helper,
            Err(e) => {
                tracing::error!(error = %e, "Display helper unavailable; install it or pass --gui");
                std::process::exit(1);
            }
        };
        match DisplayServer::spawn(&helper, &config.display_address) {
            Ok(display) => Some(display),
            Err(e) => {
                tracing::error!(error = %e, "Could not start display server");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    // --- Cancellation cascade ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    let exit_code = if cli.serve {
        serve(config, cli.port, cancel).await;
        0
    } else {
        local::run(config, cli.raw, cancel).await
    };

    // The helper outlives every job; tear it down last.
    if let Some(display) = display {
        display.shutdown().await;
    }

    std::process::exit(exit_code);
}

/// Assemble and validate the job configuration from CLI arguments.
///
/// Hosts without virtual-display support (Windows) force GUI mode: the
/// helper is skipped and no display address is injected.
fn build_config(cli: &Cli) -> Result<JobConfig, config::ConfigError> {
    let interpreter = config::find_executable(&cli.interpreter)?;

    let headless = !cli.gui && cfg!(not(windows));
    if !cli.gui && !headless {
        tracing::info!("Virtual display is unsupported on this host; launching with engine GUI");
    }

    let config = JobConfig {
        interpreter,
        engine_archive: cli.engine_archive.clone(),
        extra_args: config::normalize_delivery_args(&cli.deliver),
        artifact_path: cli.data.clone(),
        headless,
        display_address: cli.display.clone(),
    };
    config.validate()?;
    Ok(config)
}

/// Run the session server until a termination signal arrives.
async fn serve(config: JobConfig, port: u16, cancel: CancellationToken) {
    let state = AppState {
        config: Arc::new(config),
        slot: SessionSlot::new(),
        cancel: cancel.clone(),
    };

    let app = routes::router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let addr = match host.parse() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(e) => {
            tracing::error!(host = %host, error = %e, "Invalid HOST address");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind session server");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "Session server listening");

    let shutdown = cancel.clone();
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    {
        tracing::error!(error = %e, "Session server error");
    }

    tracing::info!("Session server stopped");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so in-flight
/// engine and display-helper processes are torn down whether the
/// supervisor is stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
