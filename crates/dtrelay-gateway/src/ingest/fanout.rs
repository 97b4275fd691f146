//! Per-tenant fan-out and result aggregation.
//!
//! Tenants are processed strictly in request order, one at a time. Every
//! tenant yields exactly one `TenantResult`; a failure for one tenant never
//! stops the others.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use serde::{Serialize, Serializer};
use tracing::Instrument;

use dtrelay_core::protocol::storage::build_storage_lines;
use dtrelay_core::protocol::{build_lines, merge_dimensions, LineBatch, MetricsBuilder};
use dtrelay_core::Dimensions;

use super::client::IngestClient;
use crate::obs::metrics::RelayMetrics;
use crate::tenant::{Tenant, TenantRegistry};

/// Where the metric values of a request come from.
#[derive(Debug, Clone)]
pub enum MetricSource {
    /// Free-form key/value pairs; lines carry a timestamp and optional unit metadata.
    Pairs {
        metrics: Dimensions,
        unit: Option<String>,
        timestamp_ms: i64,
    },
    /// Fixed storage-array fields keyed by form name; lines carry no timestamp.
    Storage { fields: Dimensions },
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub tenant_ids: Vec<String>,
    pub global_token: Option<String>,
    pub token_overrides: HashMap<String, String>,
    /// Request-level prefix; beats the configured default.
    pub metric_prefix: Option<String>,
    pub dims: Dimensions,
    pub source: MetricSource,
}

impl IngestRequest {
    /// Per-tenant override first, then the global token.
    pub fn token_for(&self, tenant_id: &str) -> Option<&str> {
        self.token_overrides
            .get(tenant_id)
            .map(String::as_str)
            .or(self.global_token.as_deref())
    }

    /// Prefix chosen before the configured default: the generic app only
    /// honours its own form field, the storage app the tenant's `metricPrefix`.
    pub fn prefix_for<'a>(&'a self, tenant: &'a Tenant) -> Option<&'a str> {
        match self.source {
            MetricSource::Pairs { .. } => self.metric_prefix.as_deref(),
            MetricSource::Storage { .. } => self
                .metric_prefix
                .as_deref()
                .or(tenant.metric_prefix.as_deref()),
        }
    }

    pub fn has_metrics(&self) -> bool {
        match &self.source {
            MetricSource::Pairs { metrics, .. } => !metrics.is_empty(),
            MetricSource::Storage { .. } => true,
        }
    }

    fn build(&self, metric_prefix: &str, dims: &Dimensions) -> LineBatch {
        match &self.source {
            MetricSource::Pairs { metrics, unit, timestamp_ms } => build_lines(
                metrics,
                Some(metric_prefix),
                dims,
                Some(*timestamp_ms),
                unit.as_deref(),
            ),
            MetricSource::Storage { fields } => {
                let mut builder = MetricsBuilder::new(Some(metric_prefix), dims, None);
                build_storage_lines(&mut builder, |k| fields.get(k).map(String::as_str))
            }
        }
    }
}

/// Status column of a tenant result: an HTTP code, `n/a`, or `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantStatus {
    Http(u16),
    NotApplicable,
    Error,
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantStatus::Http(code) => write!(f, "{code}"),
            TenantStatus::NotApplicable => f.write_str("n/a"),
            TenantStatus::Error => f.write_str("error"),
        }
    }
}

impl Serialize for TenantStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TenantStatus::Http(code) => serializer.serialize_u16(*code),
            TenantStatus::NotApplicable => serializer.serialize_str("n/a"),
            TenantStatus::Error => serializer.serialize_str("error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantResult {
    pub label: String,
    pub status: TenantStatus,
    pub message: String,
    pub success: bool,
    /// Newline-joined lines that were (or would have been) sent.
    pub lines: String,
    /// Raw keys skipped while building lines.
    pub warnings: Vec<String>,
}

impl TenantResult {
    fn not_sent(label: &str, message: &str, warnings: Vec<String>) -> Self {
        Self {
            label: label.to_string(),
            status: TenantStatus::NotApplicable,
            message: message.to_string(),
            success: false,
            lines: String::new(),
            warnings,
        }
    }

    /// Label value for the tenant results counter.
    pub fn outcome(&self) -> &'static str {
        match (self.success, self.status) {
            (true, _) => "accepted",
            (false, TenantStatus::Http(_)) => "http_error",
            (false, TenantStatus::NotApplicable) => "not_sent",
            (false, TenantStatus::Error) => "transport_error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Success,
    Failure,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Success => "SUCCESS",
            OverallStatus::Failure => "FAILURE",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub overall: OverallStatus,
    pub results: Vec<TenantResult>,
}

impl IngestReport {
    /// `SUCCESS` iff every tenant succeeded.
    pub fn from_results(results: Vec<TenantResult>) -> Self {
        let overall = if results.iter().all(|r| r.success) {
            OverallStatus::Success
        } else {
            OverallStatus::Failure
        };
        Self { overall, results }
    }
}

/// One fan-out pass over the tenants of a request.
pub struct FanOut<'a> {
    registry: &'a TenantRegistry,
    client: &'a dyn IngestClient,
    metrics: &'a RelayMetrics,
    default_prefix: &'a str,
    app: &'static str,
}

impl<'a> FanOut<'a> {
    pub fn new(
        registry: &'a TenantRegistry,
        client: &'a dyn IngestClient,
        metrics: &'a RelayMetrics,
        default_prefix: &'a str,
        app: &'static str,
    ) -> Self {
        Self {
            registry,
            client,
            metrics,
            default_prefix,
            app,
        }
    }

    pub async fn run(&self, req: &IngestRequest) -> IngestReport {
        tracing::info!(
            app = self.app,
            tenants = %req.tenant_ids.join(","),
            "ingest request received"
        );

        let mut results = Vec::with_capacity(req.tenant_ids.len());
        for tenant_id in &req.tenant_ids {
            let span = tracing::info_span!("tenant_ingest", app = self.app, tenant = %tenant_id);
            let result = self.ingest_one(tenant_id, req).instrument(span).await;
            self.metrics
                .tenant_results
                .inc(&[("app", self.app), ("outcome", result.outcome())]);
            results.push(result);
        }

        let report = IngestReport::from_results(results);
        tracing::info!(app = self.app, status = report.overall.as_str(), "ingest request completed");
        report
    }

    async fn ingest_one(&self, tenant_id: &str, req: &IngestRequest) -> TenantResult {
        let Some(tenant) = self.registry.get(tenant_id) else {
            tracing::warn!("unknown tenant");
            return TenantResult::not_sent(tenant_id, "Unknown tenant", Vec::new());
        };

        let Some(token) = req.token_for(&tenant.id) else {
            tracing::warn!("no token for tenant");
            return TenantResult::not_sent(&tenant.label, "Missing token", Vec::new());
        };

        let dims = merge_dimensions(&[&tenant.static_dims, &req.dims]);
        let prefix = req.prefix_for(&tenant).unwrap_or(self.default_prefix);

        let batch = self.build_batch(req, prefix, &dims);
        if batch.is_empty() {
            return TenantResult::not_sent(&tenant.label, "No numeric values provided", batch.skipped);
        }

        let started = Instant::now();
        let sent = self.client.send(&tenant, token, &batch.lines).await;
        self.metrics
            .send_duration
            .observe(&[("app", self.app)], started.elapsed());

        let lines = batch.body();
        match sent {
            Ok(resp) => {
                let success = resp.accepted();
                tracing::info!(status = resp.status, "ingest returned");
                let message = if success {
                    "Ingest accepted".to_string()
                } else if resp.body.is_empty() {
                    "Ingest failed".to_string()
                } else {
                    resp.body
                };
                TenantResult {
                    label: tenant.label.clone(),
                    status: TenantStatus::Http(resp.status),
                    message,
                    success,
                    lines,
                    warnings: batch.skipped,
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "ingest send failed");
                TenantResult {
                    label: tenant.label.clone(),
                    status: TenantStatus::Error,
                    message: err.to_string(),
                    success: false,
                    lines,
                    warnings: batch.skipped,
                }
            }
        }
    }

    fn build_batch(&self, req: &IngestRequest, prefix: &str, dims: &Dimensions) -> LineBatch {
        let batch = req.build(prefix, dims);
        if !batch.skipped.is_empty() {
            tracing::info!(skipped = ?batch.skipped, "fields skipped");
            self.metrics
                .skipped_fields
                .add(&[("app", self.app)], batch.skipped.len() as u64);
        }
        batch
    }
}
