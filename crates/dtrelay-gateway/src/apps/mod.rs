//! Ingest apps (generic metrics, storage array) and their shared plumbing.

pub mod datadomain;
pub mod metrics;

use axum::extract::State;
use axum::http::header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Serialize;
use subtle::ConstantTimeEq;

use dtrelay_core::error::{ClientCode, RelayError, Result};

use crate::app_state::AppState;
use crate::config::AuthSection;
use crate::ingest::{FormData, IngestReport};
use crate::tenant::Tenant;

/// Metadata of one ingest app, shown on the index page and exported as info gauge.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AppInfo {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Form URL.
    #[serde(rename = "url")]
    pub path: &'static str,
}

/// Registered apps, sorted by slug.
pub const APPS: &[AppInfo] = &[datadomain::INFO, metrics::INFO];

/// Check the submitted shared secret against the configured one.
pub fn authorize(auth: &AuthSection, form: &FormData) -> Result<()> {
    if auth.password.is_empty() {
        return Err(RelayError::NotConfigured("AUTH_PASSWORD"));
    }
    match form.get_non_empty("auth_password") {
        Some(given) if bool::from(given.as_bytes().ct_eq(auth.password.as_bytes())) => Ok(()),
        _ => Err(RelayError::Unauthorized),
    }
}

/// Plain-text error response for request-level rejections.
pub fn error_response(err: RelayError) -> Response {
    let status = match err.client_code() {
        ClientCode::BadRequest => StatusCode::BAD_REQUEST,
        ClientCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ClientCode::NotConfigured | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

/// Count a request rejected before fan-out and pass its response through.
fn rejected(state: &AppState, app: &'static str, resp: Response) -> Response {
    state
        .metrics()
        .ingest_requests
        .inc(&[("app", app), ("status", "REJECTED")]);
    resp
}

/// Redirect back to a form with an error message in the query string.
pub fn form_redirect(path: &str, error: &str) -> Response {
    match serde_urlencoded::to_string([("error", error)]) {
        Ok(query) => Redirect::to(&format!("{path}?{query}")).into_response(),
        Err(e) => error_response(RelayError::Internal(format!("encode redirect failed: {e}"))),
    }
}

pub fn render_page<S: Serialize>(state: &AppState, template: &str, ctx: S) -> Response {
    match state.views().render(template, ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, template, "page render failed");
            error_response(e)
        }
    }
}

pub fn render_results(state: &AppState, report: &IngestReport, back_url: &str) -> Response {
    render_page(
        state,
        "results.html",
        minijinja::context! {
            overall_status => report.overall.as_str(),
            tenant_results => &report.results,
            back_url => back_url,
        },
    )
}

/// Tenants preselected by the query: explicit `tenant_ids`, else any tenant
/// whose id appears as a non-empty query key.
pub fn selected_tenants(query: &FormData, tenants: &[&Tenant]) -> Vec<String> {
    let explicit = query.get_all("tenant_ids");
    if !explicit.is_empty() {
        return explicit.into_iter().map(str::to_string).collect();
    }
    tenants
        .iter()
        .filter(|t| query.get_non_empty(&t.id).is_some())
        .map(|t| t.id.clone())
        .collect()
}

pub async fn index(State(state): State<AppState>) -> Response {
    render_page(&state, "index.html", minijinja::context! { subapps => APPS })
}

/// Baseline security headers; handlers may set their own first.
pub async fn security_headers(mut res: Response) -> Response {
    let headers = res.headers_mut();
    headers
        .entry(X_CONTENT_TYPE_OPTIONS)
        .or_insert(HeaderValue::from_static("nosniff"));
    headers
        .entry(X_FRAME_OPTIONS)
        .or_insert(HeaderValue::from_static("DENY"));
    headers
        .entry(REFERRER_POLICY)
        .or_insert(HeaderValue::from_static("no-referrer"));
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> FormData {
        FormData::new(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn authorize_requires_configured_secret() {
        let auth = AuthSection::default();
        let err = authorize(&auth, &form(&[("auth_password", "x")])).unwrap_err();
        assert_eq!(err.client_code(), ClientCode::NotConfigured);
        assert_eq!(err.to_string(), "AUTH_PASSWORD is not configured on the server");
    }

    #[test]
    fn authorize_compares_secret() {
        let auth = AuthSection { password: "s3cret".into() };
        assert!(authorize(&auth, &form(&[("auth_password", "s3cret")])).is_ok());
        for bad in [&[("auth_password", "nope")][..], &[("auth_password", "")], &[]] {
            let err = authorize(&auth, &form(bad)).unwrap_err();
            assert_eq!(err.client_code(), ClientCode::Unauthorized);
        }
    }
}
