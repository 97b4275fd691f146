//! Submitted form data and its translation into an `IngestRequest`.

use std::collections::HashMap;

use dtrelay_core::protocol::extract_pairs;
use dtrelay_core::protocol::storage::STORAGE_GROUPS;
use dtrelay_core::Dimensions;

use super::fanout::{IngestRequest, MetricSource};
use crate::config::DefaultsSection;

const TOKEN_OVERRIDE_PREFIX: &str = "dt_token__";

/// Multi-valued form fields in submission order.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// First value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value submitted for `name`.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// `dt_token__<tenant>` fields, keyed by tenant id.
    pub fn token_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        for (k, v) in &self.fields {
            if let Some(tenant_id) = k.strip_prefix(TOKEN_OVERRIDE_PREFIX) {
                if !v.is_empty() {
                    overrides.entry(tenant_id.to_string()).or_insert_with(|| v.clone());
                }
            }
        }
        overrides
    }

    fn tenant_ids(&self) -> Vec<String> {
        self.get_all("tenant_ids").into_iter().map(str::to_string).collect()
    }
}

/// Parse the `ts` field (epoch ms, fractional input truncated), else `now_ms`.
pub fn parse_timestamp(raw: Option<&str>, now_ms: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|ts| ts.is_finite())
        .map(|ts| ts as i64)
        .unwrap_or(now_ms)
}

/// Request for the generic metrics app (dynamic key/value arrays).
pub fn pairs_request(form: &FormData, now_ms: i64) -> IngestRequest {
    let dims = extract_pairs(form.get_all("dim_keys"), form.get_all("dim_values"));
    let metrics = extract_pairs(form.get_all("metric_keys"), form.get_all("metric_values"));

    IngestRequest {
        tenant_ids: form.tenant_ids(),
        global_token: form.get_non_empty("dt_token").map(str::to_string),
        token_overrides: form.token_overrides(),
        metric_prefix: form.get_non_empty("metric_prefix").map(str::to_string),
        dims,
        source: MetricSource::Pairs {
            metrics,
            unit: form.get_non_empty("metric_unit").map(str::to_string),
            timestamp_ms: parse_timestamp(form.get("ts"), now_ms),
        },
    }
}

/// Request for the storage-array app (fixed catalogue fields).
///
/// `host`/`environment` fall back to the legacy `system`/`site` field names,
/// then to the configured defaults.
pub fn storage_request(form: &FormData, defaults: &DefaultsSection) -> IngestRequest {
    let host = form
        .get_non_empty("host")
        .or_else(|| form.get_non_empty("system"))
        .unwrap_or(defaults.host.as_str());
    let environment = form
        .get_non_empty("environment")
        .or_else(|| form.get_non_empty("site"))
        .unwrap_or(defaults.environment.as_str());

    let mut dims = Dimensions::new();
    dims.insert("host".into(), host.to_string());
    dims.insert("environment".into(), environment.to_string());

    let mut fields = Dimensions::new();
    for group in STORAGE_GROUPS {
        for f in group.fields {
            if let Some(v) = form.get(f.form_key) {
                fields.insert(f.form_key.to_string(), v.to_string());
            }
        }
    }

    IngestRequest {
        tenant_ids: form.tenant_ids(),
        global_token: form.get_non_empty("dt_token").map(str::to_string),
        token_overrides: form.token_overrides(),
        metric_prefix: None,
        dims,
        source: MetricSource::Storage { fields },
    }
}
