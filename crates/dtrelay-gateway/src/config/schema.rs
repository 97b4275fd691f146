use std::net::SocketAddr;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

use dtrelay_core::error::{RelayError, Result};
use dtrelay_core::protocol::normalise_metric_key;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub defaults: DefaultsSection,

    #[serde(default = "default_tenants_path")]
    pub tenants_path: PathBuf,

    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            auth: AuthSection::default(),
            defaults: DefaultsSection::default(),
            tenants_path: default_tenants_path(),
            logging: LoggingSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.server.listen_addr()?;
        self.defaults.validate()?;
        if self.tenants_path.as_os_str().is_empty() {
            return Err(RelayError::BadRequest("tenants_path must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            RelayError::BadRequest(format!(
                "server.listen must be a valid socket address: {}",
                self.listen
            ))
        })
    }
}

/// Shared secret checked on every ingest submission. Empty means "not configured".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            environment: default_environment(),
            metric_prefix: default_metric_prefix(),
        }
    }
}

impl DefaultsSection {
    pub fn validate(&self) -> Result<()> {
        if normalise_metric_key(None, &self.metric_prefix).is_none() {
            return Err(RelayError::BadRequest(format!(
                "defaults.metric_prefix is not a valid metric key: {:?}",
                self.metric_prefix
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Log directory; `null` logs to stderr only.
    #[serde(default = "default_log_dir")]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_log_file")]
    pub file: String,

    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Extra labels exported on `dt_relay_custom_labels`.
    #[serde(default)]
    pub custom_labels: IndexMap<String, String>,
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_host() -> String {
    "dd-system-01".into()
}
fn default_environment() -> String {
    "primary-dc".into()
}
fn default_metric_prefix() -> String {
    "custom.ddfs".into()
}
fn default_tenants_path() -> PathBuf {
    PathBuf::from("config/tenants.json")
}
fn default_log_dir() -> Option<PathBuf> {
    Some(PathBuf::from("logs"))
}
fn default_log_file() -> String {
    "dt-relay.log".into()
}
fn default_log_filter() -> String {
    "info".into()
}
