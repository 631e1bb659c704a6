//! # skillbridged: skillbridge daemon
//!
//! Composition root that wires the selected backend adapter into the
//! directive router and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise structured logging
//! - Load the static endpoint catalog
//! - Construct the backend adapter and the schedule store
//! - Build the directive router and the axum router around it
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no domain logic belongs here.

mod backend;
mod config;

use anyhow::Context;
use skillbridge_adapter_http_axum::state::AppState;
use skillbridge_app::router::DirectiveRouter;
use skillbridge_domain::catalog::Catalog;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

fn load_catalog(path: &str) -> anyhow::Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read endpoint catalog {path}"))?;
    Catalog::from_json(&content).with_context(|| format!("invalid endpoint catalog {path}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("unable to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Catalog
    let catalog = load_catalog(&config.catalog.path)?;
    tracing::info!(endpoints = catalog.len(), path = %config.catalog.path, "catalog loaded");

    // Adapters
    let (backend, schedules) = backend::build(&config)?;
    tracing::info!(
        backend = %config.backend.kind,
        schedules = schedules.is_some(),
        timeout_ms = config.backend.timeout_ms,
        "backend ready"
    );

    // Router
    let router = DirectiveRouter::new(catalog, backend, schedules, config.backend_timeout());

    // HTTP
    let app = skillbridge_adapter_http_axum::router::build(AppState::new(router));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("unable to bind {bind_addr}"))?;
    tracing::info!("skillbridged listening on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
