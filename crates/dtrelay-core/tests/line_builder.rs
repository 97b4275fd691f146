//! Line builder and dimension encoding tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use dtrelay_core::protocol::{
    build_lines, escape_dimension, format_value, merge_dimensions, sanitize_dims, Dimensions,
    MetricsBuilder, SkipReason,
};

use vector_loader::ValueVector;

fn dims(pairs: &[(&str, &str)]) -> Dimensions {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn value_vectors() {
    let vectors: Vec<ValueVector> = vector_loader::load("values.json");
    for v in vectors {
        assert_eq!(format_value(&v.raw), v.expect, "vector={}", v.description);
    }
}

#[test]
fn escape_dimension_values() {
    assert_eq!(escape_dimension("plain"), "plain");
    assert_eq!(escape_dimension("a b"), "a\\ b");
    assert_eq!(escape_dimension("k=v,w"), "k\\=v\\,w");
    assert_eq!(escape_dimension("C:\\temp"), "C:\\\\temp");
    assert_eq!(escape_dimension("quote\"stays"), "quote\"stays");
}

#[test]
fn sanitize_drops_empty_values_and_bad_keys() {
    let raw = dims(&[
        ("env", "prod"),
        ("empty", ""),
        ("9bad", "x"),
        ("data center", "dc 1"),
    ]);
    let clean = sanitize_dims(&raw);
    assert_eq!(clean, dims(&[("env", "prod"), ("data_center", "dc\\ 1")]));
}

#[test]
fn merge_prefers_later_non_empty_values() {
    let tenant = dims(&[("env", "prod"), ("team", "storage")]);
    let request = dims(&[("host", "h1"), ("team", ""), ("env", "staging")]);
    let merged = merge_dimensions(&[&tenant, &request]);

    let keys: Vec<_> = merged.keys().map(String::as_str).collect();
    assert_eq!(keys, ["env", "team", "host"]);
    assert_eq!(merged["env"], "staging");
    assert_eq!(merged["team"], "storage");
}

#[test]
fn line_without_timestamp_has_two_fields() {
    let mut builder = MetricsBuilder::new(Some("custom.ddfs"), &dims(&[("host", "dd01")]), None);
    let lines = builder.build_line("filesystem.used.bytes", "2048.0", None);
    assert_eq!(lines, ["custom.ddfs.filesystem.used.bytes,host=dd01 2048"]);
}

#[test]
fn line_with_timestamp_has_three_fields() {
    let mut builder = MetricsBuilder::new(None, &Dimensions::new(), Some(1_700_000_000_000));
    let lines = builder.build_line("queue depth", "3.14000", None);
    assert_eq!(lines, ["queue_depth 3.14 1700000000000"]);
}

#[test]
fn skip_reasons() {
    let mut builder = MetricsBuilder::new(Some("custom"), &Dimensions::new(), None);
    assert_eq!(builder.try_build_line("ok", "abc", None), Err(SkipReason::NotNumeric));
    assert_eq!(builder.try_build_line("9bad", "1", None), Err(SkipReason::InvalidKey));
    assert!(builder.build_line("%%%", "1", None).is_empty());
}

#[test]
fn oversized_exponents_are_not_numeric() {
    let mut builder = MetricsBuilder::new(Some("custom"), &Dimensions::new(), None);
    for raw in ["1e2000000", "1e-2000000", "-1e9000000000000000000", "1e-9000000000000000000"] {
        assert_eq!(builder.try_build_line("ok", raw, None), Err(SkipReason::NotNumeric), "{raw}");
    }
    assert_eq!(builder.build_line("ok", "1.5e2", None), ["custom.ok 150"]);
}

#[test]
fn unit_metadata_emitted_once_per_builder() {
    let mut builder = MetricsBuilder::new(Some("custom"), &Dimensions::new(), None);

    let first = builder.build_line("latency", "1", Some(" ms "));
    assert_eq!(first, ["#custom.latency gauge dt.meta.unit=\"ms\"", "custom.latency 1"]);

    for _ in 0..3 {
        let again = builder.build_line("latency", "2", Some("ms"));
        assert_eq!(again, ["custom.latency 2"]);
    }

    let other = builder.build_line("size", "5", Some("By"));
    assert_eq!(other.len(), 2);

    let mut fresh = MetricsBuilder::new(Some("custom"), &Dimensions::new(), None);
    assert_eq!(fresh.build_line("latency", "1", Some("ms")).len(), 2);
}

#[test]
fn unit_metadata_escapes_quotes_and_backslashes() {
    let mut builder = MetricsBuilder::new(None, &Dimensions::new(), None);
    let lines = builder.build_line("m", "1", Some("a\"b\\c"));
    assert_eq!(lines[0], "#m gauge dt.meta.unit=\"a\\\"b\\\\c\"");
}

#[test]
fn blank_unit_emits_no_metadata() {
    let mut builder = MetricsBuilder::new(None, &Dimensions::new(), None);
    assert_eq!(builder.build_line("m", "1", Some("   ")), ["m 1"]);
}

#[test]
fn skipped_metric_does_not_consume_metadata() {
    let mut builder = MetricsBuilder::new(None, &Dimensions::new(), None);
    assert!(builder.build_line("m", "nope", Some("ms")).is_empty());
    assert_eq!(builder.build_line("m", "1", Some("ms")).len(), 2);
}

#[test]
fn end_to_end_tenant_and_request_dims() {
    let tenant = dims(&[("env", "prod")]);
    let request = dims(&[("host", "h1")]);
    let merged = merge_dimensions(&[&tenant, &request]);
    let metrics = dims(&[("used bytes", "1024")]);

    let batch = build_lines(&metrics, Some("custom.fs"), &merged, Some(1_700_000_000_123), None);
    assert_eq!(batch.lines, ["custom.fs.used_bytes,env=prod,host=h1 1024 1700000000123"]);
    assert!(batch.skipped.is_empty());
}

#[test]
fn batch_reports_skipped_keys_and_keeps_going() {
    let metrics = dims(&[("a", "1"), ("bad value", "abc"), ("9lead", "2"), ("b", "2.50")]);
    let batch = build_lines(&metrics, Some("custom"), &Dimensions::new(), Some(5), Some("count"));

    assert_eq!(
        batch.lines,
        [
            "#custom.a gauge dt.meta.unit=\"count\"",
            "custom.a 1 5",
            "#custom.b gauge dt.meta.unit=\"count\"",
            "custom.b 2.5 5",
        ]
    );
    assert_eq!(batch.skipped, ["bad value", "9lead"]);
    assert_eq!(batch.body().lines().count(), 4);
}

#[test]
fn non_numeric_only_yields_no_lines() {
    let metrics = dims(&[("m", "abc")]);
    let batch = build_lines(&metrics, Some("custom"), &Dimensions::new(), Some(1), None);
    assert!(batch.is_empty());
    assert_eq!(batch.skipped, ["m"]);
}

#[test]
fn metadata_dedup_is_per_batch() {
    let metrics = dims(&[("a", "1")]);
    for _ in 0..2 {
        let batch = build_lines(&metrics, None, &Dimensions::new(), None, Some("ms"));
        assert_eq!(batch.lines.len(), 2);
    }
}
