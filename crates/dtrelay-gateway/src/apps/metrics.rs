//! Generic metrics app: arbitrary key/value metrics with custom dimensions.

use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Serialize;

use dtrelay_core::Dimensions;

use super::{authorize, error_response, form_redirect, rejected, render_page, render_results, selected_tenants, AppInfo};
use crate::app_state::AppState;
use crate::ingest::form::pairs_request;
use crate::ingest::FormData;
use crate::ops;
use crate::tenant::Tenant;

pub const SLUG: &str = "metrics";

pub const INFO: AppInfo = AppInfo {
    slug: SLUG,
    name: "Generic Metrics",
    description: "Submit arbitrary metrics with custom dimensions to Dynatrace.",
    path: "/dt-relay/metrics/",
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dt-relay/metrics", get(form))
        .route("/dt-relay/metrics/", get(form))
        .route("/dt-relay/metrics/health", get(ops::health))
        .route("/dt-relay/metrics/ingest", post(ingest))
}

#[derive(Serialize)]
struct FormDefaults<'a> {
    metric_prefix: &'a str,
    metric_unit: &'a str,
    ts: &'a str,
}

/// Rows to prefill from parallel `<kind>_keys`/`<kind>_values` query arrays.
fn query_pairs(query: &FormData, kind: &str) -> Vec<(String, String)> {
    let keys = query.get_all(&format!("{kind}_keys"));
    let values = query.get_all(&format!("{kind}_values"));
    keys.iter()
        .enumerate()
        .map(|(i, k)| (k.to_string(), values.get(i).copied().unwrap_or("").to_string()))
        .collect()
}

fn initial_dimensions(query: &FormData, defaults: &Dimensions) -> Vec<(String, String)> {
    let rows = query_pairs(query, "dim");
    if !rows.is_empty() {
        return rows;
    }
    defaults.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn initial_metrics(query: &FormData) -> Vec<(String, String)> {
    let rows = query_pairs(query, "metric");
    if rows.is_empty() {
        vec![(String::new(), String::new())]
    } else {
        rows
    }
}

async fn form(State(state): State<AppState>, Query(query): Query<Vec<(String, String)>>) -> Response {
    let query = FormData::new(query);
    let cfg = state.cfg();
    let tenants: Vec<&Tenant> = state.registry().iter().collect();

    let mut default_dims = Dimensions::new();
    default_dims.insert("host".into(), cfg.defaults.host.clone());
    default_dims.insert("environment".into(), cfg.defaults.environment.clone());

    let form_defaults = FormDefaults {
        metric_prefix: query
            .get_non_empty("metric_prefix")
            .unwrap_or(cfg.defaults.metric_prefix.as_str()),
        metric_unit: query.get("metric_unit").unwrap_or(""),
        ts: query.get("ts").unwrap_or(""),
    };

    render_page(
        &state,
        "metrics_form.html",
        minijinja::context! {
            tenants => &tenants,
            error => query.get_non_empty("error"),
            selected_tenants => selected_tenants(&query, &tenants),
            auth_configured => !cfg.auth.password.is_empty(),
            form_defaults => form_defaults,
            initial_metrics => initial_metrics(&query),
            initial_dimensions => initial_dimensions(&query, &default_dims),
        },
    )
}

async fn ingest(State(state): State<AppState>, Form(fields): Form<Vec<(String, String)>>) -> Response {
    let form = FormData::new(fields);

    if let Err(e) = authorize(&state.cfg().auth, &form) {
        tracing::warn!(app = SLUG, code = e.client_code().as_str(), "ingest rejected");
        return rejected(&state, SLUG, error_response(e));
    }

    let request = pairs_request(&form, chrono::Utc::now().timestamp_millis());
    if request.tenant_ids.is_empty() {
        return rejected(&state, SLUG, form_redirect(INFO.path, "Select at least one tenant."));
    }
    if !request.has_metrics() {
        return rejected(&state, SLUG, form_redirect(INFO.path, "Add at least one metric."));
    }

    let report = state.fan_out(SLUG).run(&request).await;
    state
        .metrics()
        .ingest_requests
        .inc(&[("app", SLUG), ("status", report.overall.as_str())]);
    tracing::info!(
        app = SLUG,
        tenants = request.tenant_ids.len(),
        overall = report.overall.as_str(),
        "ingest finished"
    );

    render_results(&state, &report, INFO.path)
}
