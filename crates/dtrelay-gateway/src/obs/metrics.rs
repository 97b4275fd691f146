//! Metrics registry and Prometheus text rendering for the relay.
//!
//! Labels are flattened into sorted key vectors to keep deterministic series
//! identity. Histogram buckets are fixed in microseconds to avoid floating
//! point math.

use dashmap::DashMap;
use indexmap::IndexMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Escape a label value.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n").replace('"', "\\\"")
}

/// Make an arbitrary string a legal Prometheus label name.
///
/// Unlike metric/dimension keys, digit-led names are rescued with a leading
/// `_` and an empty name becomes `_`.
pub fn sanitize_label_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        return "_".into();
    }
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{sanitized}");
    }
    sanitized
}

/// `k="v",...` sorted by sanitized name.
fn format_labels<'a>(labels: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut pairs: Vec<(String, String)> = labels
        .into_iter()
        .map(|(k, v)| (sanitize_label_name(k), escape_label(v)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect::<Vec<_>>()
        .join(",")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn render_key(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 when never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, render_key(r.key()), val);
        }
    }
}

// 1ms, 5ms, 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const BUCKETS_MICROS: [u64; 11] = [
    1_000, 5_000, 10_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000, 5_000_000,
    10_000_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 11],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for an exact label set.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} histogram");
        for r in self.map.iter() {
            let hist = r.value();
            let label_str = render_key(r.key());
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{label_str},")
            };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {count}");
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_sum{{{label_str}}} {sum}");
            let _ = writeln!(out, "{name}_count{{{label_str}}} {count}");
        }
    }
}

/// Static facts about the running service, rendered as gauges.
pub struct ServiceInfo<'a> {
    pub tenants: usize,
    /// `(slug, name, description)` per ingest app.
    pub apps: &'a [(&'a str, &'a str, &'a str)],
    pub custom_labels: &'a IndexMap<String, String>,
}

#[derive(Default)]
pub struct RelayMetrics {
    pub ingest_requests: CounterVec,
    pub tenant_results: CounterVec,
    pub skipped_fields: CounterVec,
    pub send_duration: HistogramVec, // In Microseconds
}

impl RelayMetrics {
    /// Service info gauges first, then the in-process series.
    pub fn render(&self, info: &ServiceInfo<'_>) -> String {
        let mut sections: Vec<String> = Vec::new();

        sections.push(format!(
            "# HELP dt_relay_tenants Number of configured tenants.\n\
             # TYPE dt_relay_tenants gauge\n\
             dt_relay_tenants {}",
            info.tenants
        ));
        sections.push(format!(
            "# HELP dt_relay_subapps Number of registered ingest apps.\n\
             # TYPE dt_relay_subapps gauge\n\
             dt_relay_subapps {}",
            info.apps.len()
        ));

        if !info.apps.is_empty() {
            let mut s = String::from(
                "# HELP dt_relay_subapp_info Ingest app metadata.\n# TYPE dt_relay_subapp_info gauge",
            );
            for (slug, name, description) in info.apps {
                let mut labels = vec![("slug", *slug), ("name", *name)];
                if !description.is_empty() {
                    labels.push(("description", *description));
                }
                let _ = write!(s, "\ndt_relay_subapp_info{{{}}} 1", format_labels(labels));
            }
            sections.push(s);
        }

        if !info.custom_labels.is_empty() {
            let labels = info
                .custom_labels
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()));
            sections.push(format!(
                "# HELP dt_relay_custom_labels Custom key/value metadata attached to relay metrics.\n\
                 # TYPE dt_relay_custom_labels gauge\n\
                 dt_relay_custom_labels{{{}}} 1",
                format_labels(labels)
            ));
        }

        let mut series = String::new();
        self.ingest_requests.render(
            "dt_relay_ingest_requests_total",
            "Ingest submissions by app and overall status.",
            &mut series,
        );
        self.tenant_results.render(
            "dt_relay_tenant_results_total",
            "Per-tenant ingest outcomes.",
            &mut series,
        );
        self.skipped_fields.render(
            "dt_relay_skipped_fields_total",
            "Metric fields dropped for an illegal key or non-numeric value.",
            &mut series,
        );
        self.send_duration.render(
            "dt_relay_send_duration_micros",
            "Outbound ingest call latency in microseconds.",
            &mut series,
        );
        sections.push(series.trim_end().to_string());

        sections.join("\n\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_are_rescued() {
        assert_eq!(sanitize_label_name("team"), "team");
        assert_eq!(sanitize_label_name(" data center "), "data_center");
        assert_eq!(sanitize_label_name("9lives"), "_9lives");
        assert_eq!(sanitize_label_name(""), "_");
        assert_eq!(sanitize_label_name("a.b-c"), "a_b_c");
    }

    #[test]
    fn labels_are_sorted_and_escaped() {
        let s = format_labels([("b", "x\"y"), ("a", "line\nbreak")]);
        assert_eq!(s, "a=\"line\\nbreak\",b=\"x\\\"y\"");
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let h = HistogramVec::default();
        h.observe(&[("app", "m")], Duration::from_millis(3));
        let mut out = String::new();
        h.render("lat", "help", &mut out);
        assert!(out.contains("lat_bucket{app=\"m\",le=\"1000\"} 0"));
        assert!(out.contains("lat_bucket{app=\"m\",le=\"5000\"} 1"));
        assert!(out.contains("lat_bucket{app=\"m\",le=\"+Inf\"} 1"));
        assert!(out.contains("lat_sum{app=\"m\"} 3000"));
    }

    #[test]
    fn render_includes_info_and_series() {
        let m = RelayMetrics::default();
        m.ingest_requests.inc(&[("app", "metrics"), ("status", "SUCCESS")]);
        let labels: IndexMap<String, String> = [("team".to_string(), "storage".to_string())].into_iter().collect();
        let apps = [("metrics", "Generic Metrics", "")];
        let out = m.render(&ServiceInfo { tenants: 2, apps: &apps, custom_labels: &labels });

        assert!(out.contains("dt_relay_tenants 2\n"));
        assert!(out.contains("dt_relay_subapps 1\n"));
        assert!(out.contains("dt_relay_subapp_info{name=\"Generic Metrics\",slug=\"metrics\"} 1"));
        assert!(out.contains("dt_relay_custom_labels{team=\"storage\"} 1"));
        assert!(out.contains("dt_relay_ingest_requests_total{app=\"metrics\",status=\"SUCCESS\"} 1"));
        assert!(out.ends_with('\n'));
    }
}
