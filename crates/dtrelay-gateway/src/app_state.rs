//! Shared application state for the relay.
//!
//! Everything here is built once at startup and read-only afterwards, so
//! handlers share it through a cheap `Arc` clone without locking.

use std::sync::Arc;

use dtrelay_core::error::Result;

use crate::config::RelayConfig;
use crate::ingest::{FanOut, IngestClient};
use crate::obs::metrics::RelayMetrics;
use crate::tenant::TenantRegistry;
use crate::views::Views;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: RelayConfig,
    registry: TenantRegistry,
    client: Arc<dyn IngestClient>,
    metrics: RelayMetrics,
    views: Views,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle template errors gracefully (no panic).
    pub fn new(cfg: RelayConfig, registry: TenantRegistry, client: Arc<dyn IngestClient>) -> Result<Self> {
        let views = Views::new()?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                client,
                metrics: RelayMetrics::default(),
                views,
            }),
        })
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &TenantRegistry {
        &self.inner.registry
    }

    pub fn metrics(&self) -> &RelayMetrics {
        &self.inner.metrics
    }

    pub fn views(&self) -> &Views {
        &self.inner.views
    }

    /// Fan-out over this state's registry and client on behalf of `app`.
    pub fn fan_out(&self, app: &'static str) -> FanOut<'_> {
        FanOut::new(
            &self.inner.registry,
            self.inner.client.as_ref(),
            &self.inner.metrics,
            &self.inner.cfg.defaults.metric_prefix,
            app,
        )
    }
}
