//! dt-relay gateway binary.
//!
//! Usage: `dt-relay [config.yaml]` (else `DT_RELAY_CONFIG`, else
//! `dt-relay.yaml` in the working directory, which may be absent).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use dtrelay_core::error::{RelayError, Result};
use dtrelay_gateway::ingest::HttpIngestClient;
use dtrelay_gateway::tenant::TenantRegistry;
use dtrelay_gateway::{app_state, config, logging, router};

fn config_path() -> (PathBuf, bool) {
    if let Some(arg) = std::env::args_os().nth(1) {
        return (PathBuf::from(arg), true);
    }
    match std::env::var_os("DT_RELAY_CONFIG") {
        Some(p) if !p.is_empty() => (PathBuf::from(p), true),
        _ => (PathBuf::from(config::DEFAULT_CONFIG_FILE), false),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn run() -> Result<()> {
    let (path, required) = config_path();
    let loaded = logging::with_bootstrap(|| {
        config::load(&path, required).map_err(|e| {
            tracing::error!(config = %path.display(), error = %e, "config load failed");
            e
        })
    })?;
    let cfg = loaded.config;

    logging::init(&cfg.logging);
    for note in &loaded.notes {
        tracing::info!(config = %path.display(), "{note}");
    }

    let listen = cfg.server.listen_addr()?;
    let registry = TenantRegistry::load_from_file(&cfg.tenants_path)?;
    if registry.is_empty() {
        tracing::warn!(path = %cfg.tenants_path.display(), "no tenants configured");
    } else {
        tracing::info!(tenants = registry.len(), "tenant registry loaded");
    }
    if cfg.auth.password.is_empty() {
        tracing::warn!("AUTH_PASSWORD is not configured; ingest submissions will be rejected");
    }

    let client = Arc::new(HttpIngestClient::new()?);
    let state = app_state::AppState::new(cfg, registry, client)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "dt-relay starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| RelayError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RelayError::Internal(format!("server failed: {e}")))?;

    tracing::info!("dt-relay stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "dt-relay exited with error");
            ExitCode::FAILURE
        }
    }
}
