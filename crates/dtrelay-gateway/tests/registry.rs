#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use dtrelay_gateway::tenant::TenantRegistry;

#[test]
fn list_form_normalizes_entries() {
    let reg = TenantRegistry::from_json_str(
        r#"[
          {"id": "prod", "label": "Production", "baseUrl": "https://abc.live.example.com/",
           "metricPrefix": "prod.dd", "staticDims": {"team": "storage"}},
          {"id": "dev", "baseUrl": "https://dev.example.com", "metricPrefix": "  "}
        ]"#,
    )
    .expect("registry");

    assert_eq!(reg.len(), 2);
    let prod = reg.get("prod").unwrap();
    assert_eq!(prod.label, "Production");
    assert_eq!(prod.base_url, "https://abc.live.example.com");
    assert_eq!(prod.metric_prefix.as_deref(), Some("prod.dd"));
    assert_eq!(prod.static_dims.get("team").map(String::as_str), Some("storage"));

    let dev = reg.get("dev").unwrap();
    assert_eq!(dev.label, "dev");
    assert!(dev.metric_prefix.is_none());
    assert!(dev.static_dims.is_empty());

    let ids: Vec<&str> = reg.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["prod", "dev"]);
}

#[test]
fn static_dims_accept_json_scalars() {
    let reg = TenantRegistry::from_json_str(
        r#"[{"id": "prod", "baseUrl": "https://prod.example",
             "staticDims": {"tier": 2, "managed": true, "ratio": 0.5, "team": "storage", "gone": null}}]"#,
    )
    .expect("registry");

    let dims = &reg.get("prod").unwrap().static_dims;
    let pairs: Vec<(&str, &str)> = dims.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    assert_eq!(
        pairs,
        vec![("tier", "2"), ("managed", "true"), ("ratio", "0.5"), ("team", "storage")]
    );
}

#[test]
fn map_form_uses_entry_ids() {
    let reg = TenantRegistry::from_json_str(
        r#"{"first": {"id": "a", "baseUrl": "https://a.example"},
            "second": {"id": "b", "baseUrl": "https://b.example//"}}"#,
    )
    .expect("registry");

    assert!(reg.get("first").is_none());
    assert_eq!(reg.get("b").unwrap().base_url, "https://b.example");
}

#[test]
fn invalid_json_is_rejected() {
    let err = TenantRegistry::from_json_str(r#"[{"label": "no id"}]"#).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tenants.json");
    std::fs::write(&path, r#"[{"id": "x", "baseUrl": "https://x.example"}]"#).unwrap();

    let reg = TenantRegistry::load_from_file(&path).unwrap();
    assert_eq!(reg.len(), 1);

    let err = TenantRegistry::load_from_file(&dir.path().join("nope.json")).expect_err("missing");
    assert_eq!(err.client_code().as_str(), "INTERNAL");
}

#[test]
fn empty_registry_is_allowed() {
    let reg = TenantRegistry::from_json_str("[]").unwrap();
    assert!(reg.is_empty());
}
