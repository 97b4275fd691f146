#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::path::Path;

use dtrelay_gateway::config;
use dtrelay_gateway::config::env::{apply_overrides, parse_custom_labels};
use dtrelay_gateway::config::RelayConfig;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
defaults:
  host: "dd1"
  metric_prefx: "typo.should.fail"
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:8000");
    assert_eq!(cfg.defaults.host, "dd-system-01");
    assert_eq!(cfg.defaults.environment, "primary-dc");
    assert_eq!(cfg.defaults.metric_prefix, "custom.ddfs");
    assert_eq!(cfg.tenants_path, Path::new("config/tenants.json"));
    assert!(cfg.auth.password.is_empty());
    assert!(cfg.metrics.custom_labels.is_empty());
}

#[test]
fn full_config_round_trips_sections() {
    let ok = r#"
version: 1
server: { listen: "127.0.0.1:9000" }
auth: { password: "s3cret" }
defaults: { host: "dd2", environment: "dr-site", metric_prefix: "storage.dd" }
tenants_path: "/etc/dt-relay/tenants.json"
logging: { dir: null, file: "relay.log", filter: "debug" }
metrics:
  custom_labels: { team: storage }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 9000);
    assert_eq!(cfg.auth.password, "s3cret");
    assert_eq!(cfg.defaults.metric_prefix, "storage.dd");
    assert!(cfg.logging.dir.is_none());
    assert_eq!(cfg.metrics.custom_labels.get("team").map(String::as_str), Some("storage"));
}

#[test]
fn validation_rejects_bad_values() {
    for bad in [
        "version: 2\n",
        "version: 1\nserver: { listen: \"not-an-addr\" }\n",
        "version: 1\ndefaults: { metric_prefix: \"9bad\" }\n",
        "version: 1\ntenants_path: \"\"\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "{bad}");
    }
}

#[test]
fn env_overrides_win_over_file_values() {
    let mut cfg = config::load_from_str("version: 1\nauth: { password: file }\n").unwrap();
    let env: HashMap<&str, &str> = [
        ("AUTH_PASSWORD", "env"),
        ("DEFAULT_DIM_SYSTEM", "legacy-host"),
        ("DEFAULT_DIM_ENVIRONMENT", "lab"),
        ("DEFAULT_DIM_SITE", "ignored"),
        ("METRIC_PREFIX", "ops.storage"),
        ("DT_RELAY_LISTEN", "127.0.0.1:8081"),
        ("METRICS_CUSTOM_LABELS", "team=storage,broken,owner = ops"),
    ]
    .into_iter()
    .collect();

    let notes = apply_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

    assert_eq!(cfg.auth.password, "env");
    assert_eq!(cfg.defaults.host, "legacy-host");
    assert_eq!(cfg.defaults.environment, "lab");
    assert_eq!(cfg.defaults.metric_prefix, "ops.storage");
    assert_eq!(cfg.server.listen, "127.0.0.1:8081");
    assert_eq!(cfg.metrics.custom_labels.len(), 2);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("broken"));
}

#[test]
fn empty_env_values_are_unset() {
    let mut cfg = RelayConfig::default();
    let notes = apply_overrides(&mut cfg, |k| (k == "AUTH_PASSWORD").then(String::new));
    assert!(cfg.auth.password.is_empty());
    assert!(notes.is_empty());
}

#[test]
fn custom_labels_accept_json_object() {
    let (labels, ignored) = parse_custom_labels(r#"{"team": "storage", "tier": 1}"#);
    assert_eq!(labels.get("team").map(String::as_str), Some("storage"));
    assert_eq!(labels.get("tier").map(String::as_str), Some("1"));
    assert!(ignored.is_empty());
}

#[test]
fn load_reads_file_and_tolerates_missing_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dt-relay.yaml");
    std::fs::write(&path, "version: 1\ndefaults: { host: from-file }\n").unwrap();

    let loaded = config::load(&path, true).unwrap();
    assert_eq!(loaded.config.tenants_path, Path::new("config/tenants.json"));

    let missing = dir.path().join("absent.yaml");
    let loaded = config::load(&missing, false).unwrap();
    assert!(loaded.notes.iter().any(|n| n.contains("not found")));

    let err = config::load(&missing, true).expect_err("explicit path must exist");
    assert_eq!(err.client_code().as_str(), "INTERNAL");
}
