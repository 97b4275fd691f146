//! Ingest pipeline: form parsing, per-tenant fan-out, and the outbound client.

pub mod client;
pub mod fanout;
pub mod form;

pub use client::{HttpIngestClient, IngestClient, IngestResponse, SendError, SEND_TIMEOUT};
pub use fanout::{FanOut, IngestReport, IngestRequest, MetricSource, OverallStatus, TenantResult, TenantStatus};
pub use form::FormData;
