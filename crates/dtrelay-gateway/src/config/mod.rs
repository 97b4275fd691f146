//! Relay config loader (strict YAML + environment overrides).

pub mod env;
pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use dtrelay_core::error::{RelayError, Result};

pub use schema::{AuthSection, DefaultsSection, LoggingSection, MetricsSection, RelayConfig, ServerSection};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dt-relay.yaml";

/// Loaded config plus notes worth logging once the subscriber is up.
#[derive(Debug)]
pub struct Loaded {
    pub config: RelayConfig,
    pub notes: Vec<String>,
}

/// Load `path`, apply process environment overrides, then validate.
///
/// A missing file is only tolerated for the default path, in which case the
/// built-in defaults are used.
pub fn load(path: &Path, required: bool) -> Result<Loaded> {
    let mut notes = Vec::new();
    let mut config = match fs::read_to_string(path) {
        Ok(s) => parse_str(&s)?,
        Err(e) if e.kind() == ErrorKind::NotFound && !required => {
            notes.push(format!("config file {} not found, using defaults", path.display()));
            RelayConfig::default()
        }
        Err(e) => {
            return Err(RelayError::Internal(format!(
                "read config {} failed: {e}",
                path.display()
            )))
        }
    };

    notes.extend(env::apply_overrides(&mut config, |name| std::env::var(name).ok()));
    config.validate()?;
    Ok(Loaded { config, notes })
}

/// Parse and validate a YAML document without touching the environment.
pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse_str(s: &str) -> Result<RelayConfig> {
    serde_yaml::from_str(s).map_err(|e| RelayError::BadRequest(format!("invalid yaml: {e}")))
}
