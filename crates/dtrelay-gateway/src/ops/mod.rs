//! Operational HTTP endpoints.
//!
//! - `/health`   : liveness (also mounted under each app)
//! - `/metrics/` : Prometheus text format

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::app_state::AppState;
use crate::apps::APPS;
use crate::obs::metrics::ServiceInfo;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, [(CONTENT_TYPE, "text/plain; charset=utf-8")], "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let apps: Vec<(&str, &str, &str)> = APPS
        .iter()
        .map(|a| (a.slug, a.name, a.description))
        .collect();
    let body = state.metrics().render(&ServiceInfo {
        tenants: state.registry().len(),
        apps: &apps,
        custom_labels: &state.cfg().metrics.custom_labels,
    });

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
