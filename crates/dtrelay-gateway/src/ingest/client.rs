//! Outbound ingest client.
//!
//! `send` returns a tagged result: any HTTP response (whatever the status)
//! is `Ok`, and only transport-level failures are `Err`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;

use dtrelay_core::error::{RelayError, Result};

use crate::tenant::Tenant;

/// Fixed per-send timeout.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub const INGEST_PATH: &str = "/api/v2/metrics/ingest";
pub const INGEST_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResponse {
    pub status: u16,
    pub body: String,
}

impl IngestResponse {
    pub fn accepted(&self) -> bool {
        matches!(self.status, 200 | 202)
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("{0}")]
    Transport(String),
}

/// Delivers one batch of lines to one tenant.
#[async_trait]
pub trait IngestClient: Send + Sync {
    async fn send(&self, tenant: &Tenant, token: &str, lines: &[String]) -> std::result::Result<IngestResponse, SendError>;
}

pub fn ingest_url(tenant: &Tenant) -> String {
    format!("{}{INGEST_PATH}", tenant.base_url)
}

/// `reqwest`-backed client used in production.
#[derive(Debug, Clone)]
pub struct HttpIngestClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpIngestClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(SEND_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Internal(format!("http client init failed: {e}")))?;
        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl IngestClient for HttpIngestClient {
    async fn send(&self, tenant: &Tenant, token: &str, lines: &[String]) -> std::result::Result<IngestResponse, SendError> {
        let resp = self
            .http
            .post(ingest_url(tenant))
            .header(AUTHORIZATION, format!("Api-Token {token}"))
            .header(CONTENT_TYPE, INGEST_CONTENT_TYPE)
            .body(lines.join("\n"))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.classify(e))?;
        Ok(IngestResponse { status, body })
    }
}

impl HttpIngestClient {
    fn classify(&self, err: reqwest::Error) -> SendError {
        if err.is_timeout() {
            SendError::Timeout(self.timeout)
        } else {
            SendError::Transport(err.to_string())
        }
    }
}
