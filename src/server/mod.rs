/// HTTP server for host health checks

pub mod handlers;
pub mod routes;

pub use routes::create_router;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::core::command::{CommandRunner, TokioCommandRunner};
use crate::core::config::Config;
use crate::core::metrics::Metric;

/// Read-only context shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<dyn CommandRunner>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            started_at: Instant::now(),
        }
    }
}

/// Bind and serve until SIGINT/SIGTERM
pub async fn run(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let state = AppState::new(Arc::new(config), Arc::new(TokioCommandRunner));
    let app = create_router(state.clone());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind listener");
            return Err(e).with_context(|| format!("Failed to bind {}", addr));
        }
    };

    info!(%addr, "host health server listening");
    for metric in Metric::ALL {
        info!(path = metric.path(), check = metric.subject(), "endpoint registered");
    }
    info!(
        disk_device = %state.config.disk_device,
        tmp_path = %state.config.tmp_path,
        watched_port = state.config.watched_port,
        timeout = %humantime::format_duration(state.config.command_timeout),
        "collector settings"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
