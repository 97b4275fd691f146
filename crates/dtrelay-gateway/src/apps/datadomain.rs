//! Storage-array app: a fixed catalogue of capacity, alert and hardware fields.

use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Serialize;

use dtrelay_core::protocol::storage::STORAGE_GROUPS;

use super::{authorize, error_response, form_redirect, rejected, render_page, render_results, selected_tenants, AppInfo};
use crate::app_state::AppState;
use crate::ingest::form::storage_request;
use crate::ingest::FormData;
use crate::ops;
use crate::tenant::Tenant;

pub const SLUG: &str = "datadomain";

pub const INFO: AppInfo = AppInfo {
    slug: SLUG,
    name: "Datadomain",
    description: "Ingest Data Domain storage metrics into Dynatrace.",
    path: "/dt-relay/datadomain/",
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dt-relay/datadomain", get(form))
        .route("/dt-relay/datadomain/", get(form))
        .route("/dt-relay/datadomain/health", get(ops::health))
        .route("/dt-relay/datadomain/ingest", post(ingest))
}

#[derive(Serialize)]
struct FieldView<'a> {
    key: &'static str,
    label: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct GroupView<'a> {
    heading: &'static str,
    fields: Vec<FieldView<'a>>,
}

fn groups(query: &FormData) -> Vec<GroupView<'_>> {
    STORAGE_GROUPS
        .iter()
        .map(|g| GroupView {
            heading: g.heading,
            fields: g
                .fields
                .iter()
                .map(|f| FieldView {
                    key: f.form_key,
                    label: f.label,
                    value: query.get(f.form_key).unwrap_or(""),
                })
                .collect(),
        })
        .collect()
}

async fn form(State(state): State<AppState>, Query(query): Query<Vec<(String, String)>>) -> Response {
    let query = FormData::new(query);
    let cfg = state.cfg();
    let tenants: Vec<&Tenant> = state.registry().iter().collect();

    let host = query
        .get_non_empty("host")
        .or_else(|| query.get_non_empty("system"))
        .unwrap_or(cfg.defaults.host.as_str());
    let environment = query
        .get_non_empty("environment")
        .or_else(|| query.get_non_empty("site"))
        .unwrap_or(cfg.defaults.environment.as_str());

    render_page(
        &state,
        "datadomain_form.html",
        minijinja::context! {
            tenants => &tenants,
            error => query.get_non_empty("error"),
            selected_tenants => selected_tenants(&query, &tenants),
            auth_configured => !cfg.auth.password.is_empty(),
            form_defaults => minijinja::context! { host => host, environment => environment },
            groups => groups(&query),
        },
    )
}

async fn ingest(State(state): State<AppState>, Form(fields): Form<Vec<(String, String)>>) -> Response {
    let form = FormData::new(fields);

    if let Err(e) = authorize(&state.cfg().auth, &form) {
        tracing::warn!(app = SLUG, code = e.client_code().as_str(), "ingest rejected");
        return rejected(&state, SLUG, error_response(e));
    }

    let request = storage_request(&form, &state.cfg().defaults);
    if request.tenant_ids.is_empty() {
        return rejected(&state, SLUG, form_redirect(INFO.path, "Select at least one tenant."));
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
