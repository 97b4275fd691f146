//! Axum router wiring.
//!
//! Index and health at the root and under `/dt-relay/`, the operational
//! metrics page, then each ingest app's own routes.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, apps, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(apps::index))
        .route("/dt-relay", get(apps::index))
        .route("/dt-relay/", get(apps::index))
        .route("/health", get(ops::health))
        .route("/dt-relay/health", get(ops::health))
        .route("/metrics/", get(ops::metrics))
        .merge(apps::metrics::routes())
        .merge(apps::datadomain::routes())
        .layer(middleware::map_response(apps::security_headers))
        .with_state(state)
}
