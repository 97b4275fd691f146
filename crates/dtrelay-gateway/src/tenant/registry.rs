use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dtrelay_core::error::{RelayError, Result};
use dtrelay_core::Dimensions;

/// A backend destination metrics can be sent to.
#[derive(Debug, Clone, Serialize)]
pub struct Tenant {
    pub id: String,
    pub label: String,
    /// Base URL without trailing `/`.
    pub base_url: String,
    pub metric_prefix: Option<String>,
    pub static_dims: Dimensions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TenantEntry {
    id: String,
    #[serde(default)]
    label: Option<String>,
    base_url: String,
    #[serde(default)]
    metric_prefix: Option<String>,
    /// Scalars of any JSON type; stringified on load.
    #[serde(default)]
    static_dims: Option<IndexMap<String, Value>>,
}

/// Strings are taken as-is, other scalars in their JSON form, `null` dropped.
fn stringify_dims(raw: IndexMap<String, Value>) -> Dimensions {
    raw.into_iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect()
}

impl From<TenantEntry> for Tenant {
    fn from(e: TenantEntry) -> Self {
        Self {
            label: e.label.unwrap_or_else(|| e.id.clone()),
            base_url: e.base_url.trim_end_matches('/').to_string(),
            metric_prefix: e.metric_prefix.filter(|p| !p.trim().is_empty()),
            static_dims: e.static_dims.map(stringify_dims).unwrap_or_default(),
            id: e.id,
        }
    }
}

/// The registry file holds either a list of tenants or a map of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    List(Vec<TenantEntry>),
    Map(IndexMap<String, TenantEntry>),
}

/// Immutable tenant lookup, keyed by id, in file order.
#[derive(Debug, Default)]
pub struct TenantRegistry {
    tenants: IndexMap<String, Arc<Tenant>>,
}

impl TenantRegistry {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).map_err(|e| {
            RelayError::Internal(format!("read tenants {} failed: {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(s)
            .map_err(|e| RelayError::BadRequest(format!("invalid tenants json: {e}")))?;
        let entries: Vec<TenantEntry> = match file {
            RegistryFile::List(list) => list,
            RegistryFile::Map(map) => map.into_values().collect(),
        };
        Ok(Self::from_tenants(entries.into_iter().map(Tenant::from)))
    }

    /// Later duplicates of an id replace earlier ones.
    pub fn from_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let tenants = tenants
            .into_iter()
            .map(|t| (t.id.clone(), Arc::new(t)))
            .collect();
        Self { tenants }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Tenant>> {
        self.tenants.get(id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tenant> {
        self.tenants.values().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
