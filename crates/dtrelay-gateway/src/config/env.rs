//! Environment overrides.
//!
//! Applied after the config file and before validation. Empty variables
//! count as unset.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;

use super::schema::RelayConfig;

/// Apply overrides from `lookup` (normally `std::env::var`). Returns notes
/// about ignored input, to be logged by the caller.
pub fn apply_overrides<F>(cfg: &mut RelayConfig, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut notes = Vec::new();

    if let Some(v) = get("AUTH_PASSWORD") {
        cfg.auth.password = v;
    }
    if let Some(v) = get("DEFAULT_DIM_HOST").or_else(|| get("DEFAULT_DIM_SYSTEM")) {
        cfg.defaults.host = v;
    }
    if let Some(v) = get("DEFAULT_DIM_ENVIRONMENT").or_else(|| get("DEFAULT_DIM_SITE")) {
        cfg.defaults.environment = v;
    }
    if let Some(v) = get("METRIC_PREFIX") {
        cfg.defaults.metric_prefix = v;
    }
    if let Some(v) = get("DT_RELAY_TENANTS") {
        cfg.tenants_path = PathBuf::from(v);
    }
    if let Some(v) = get("DT_RELAY_LISTEN") {
        cfg.server.listen = v;
    }
    if let Some(v) = get("METRICS_CUSTOM_LABELS") {
        let (labels, ignored) = parse_custom_labels(&v);
        notes.extend(
            ignored
                .into_iter()
                .map(|chunk| format!("ignoring custom metrics label chunk: {chunk:?}")),
        );
        cfg.metrics.custom_labels = labels;
    }

    notes
}

/// Parse custom labels from a JSON object or a `key=value,key=value` list.
///
/// Returns the labels and the chunks that were ignored (no `=`, empty key).
pub fn parse_custom_labels(raw: &str) -> (IndexMap<String, String>, Vec<String>) {
    let raw = raw.trim();
    let mut labels = IndexMap::new();
    let mut ignored = Vec::new();
    if raw.is_empty() {
        return (labels, ignored);
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        for (k, v) in map {
            let key = k.trim();
            if key.is_empty() {
                continue;
            }
            let value = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            labels.insert(key.to_string(), value);
        }
        return (labels, ignored);
    }

    for chunk in raw.split(',') {
        let piece = chunk.trim();
        if piece.is_empty() {
            continue;
        }
        match piece.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                labels.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => ignored.push(piece.to_string()),
        }
    }
    (labels, ignored)
}
