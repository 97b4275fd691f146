//! Fixed storage-array form fields.
//!
//! The storage app posts one numeric field per gauge; each field maps to a
//! metric suffix that is then prefixed per tenant.

use super::line::{LineBatch, MetricsBuilder};

#[derive(Debug, Clone, Copy)]
pub struct StorageField {
    /// Form field name.
    pub form_key: &'static str,
    /// Metric suffix (before prefixing).
    pub metric_suffix: &'static str,
    /// Human label for the form.
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldGroup {
    pub heading: &'static str,
    pub fields: &'static [StorageField],
}

const fn field(form_key: &'static str, metric_suffix: &'static str, label: &'static str) -> StorageField {
    StorageField { form_key, metric_suffix, label }
}

pub const STORAGE_GROUPS: &[FieldGroup] = &[
    FieldGroup {
        heading: "Filesystem capacity (bytes)",
        fields: &[
            field("usedBytes", "filesystem.used.bytes", "Used"),
            field("availableBytes", "filesystem.available.bytes", "Available"),
            field("totalBytes", "filesystem.total.bytes", "Total"),
        ],
    },
    FieldGroup {
        heading: "Alerts",
        fields: &[
            field("criticalAlerts", "alerts.critical.count", "Critical"),
            field("warningAlerts", "alerts.warning.count", "Warning"),
        ],
    },
    FieldGroup {
        heading: "Enclosures",
        fields: &[
            field("enclosuresNormal", "enclosures.normal.count", "Normal"),
            field("enclosuresDegraded", "enclosures.degraded.count", "Degraded"),
        ],
    },
    FieldGroup {
        heading: "Drives",
        fields: &[
            field("drivesOperational", "drives.operational.count", "Operational"),
            field("drivesSpare", "drives.spare.count", "Spare"),
            field("drivesFailed", "drives.failed.count", "Failed"),
        ],
    },
];

/// Build lines for every catalogued field, group by group.
///
/// Blank or absent fields are simply left out. A field that was filled in
/// but is not numeric is reported in `skipped` under its form key.
pub fn build_storage_lines<'a, F>(builder: &mut MetricsBuilder, lookup: F) -> LineBatch
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut batch = LineBatch::default();
    for group in STORAGE_GROUPS {
        for f in group.fields {
            let raw = match lookup(f.form_key) {
                Some(raw) if !raw.trim().is_empty() => raw,
                _ => continue,
            };
            let lines = builder.build_line(f.metric_suffix, raw, None);
            if lines.is_empty() {
                batch.skipped.push(f.form_key.to_string());
            }
            batch.lines.extend(lines);
        }
    }
    batch
}
