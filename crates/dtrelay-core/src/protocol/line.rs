//! Line assembly.
//!
//! Data line:     `name[,dim=value,...] value [timestamp-ms]`
//! Metadata line: `#name gauge dt.meta.unit="unit"`

use std::collections::HashSet;
use std::str::FromStr;

use bigdecimal::num_bigint::Sign;
use bigdecimal::BigDecimal;

use super::dims::sanitize_dims;
use super::key::normalise_metric_key;
use super::Dimensions;

/// Why a metric entry produced no line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Value is not a finite decimal number.
    NotNumeric,
    /// Key cannot be normalized into a legal metric name.
    InvalidKey,
}

/// Values whose leading digit sits beyond `10^±MAX_DECIMAL_EXPONENT` are not
/// rendered; their plain form would be unbounded in size.
const MAX_DECIMAL_EXPONENT: i128 = 1_000;

/// Parse `raw` as a decimal and render it for the wire.
///
/// Integral values get zero decimal places, everything else is rendered in
/// trimmed plain notation. Exponent input is accepted, exponent output never
/// produced. Magnitudes past `MAX_DECIMAL_EXPONENT` count as not numeric.
///
/// ```
/// use dtrelay_core::protocol::format_value;
///
/// assert_eq!(format_value("3.0").as_deref(), Some("3"));
/// assert_eq!(format_value("3.14000").as_deref(), Some("3.14"));
/// assert_eq!(format_value("abc"), None);
/// ```
pub fn format_value(raw: &str) -> Option<String> {
    let value = BigDecimal::from_str(raw.trim()).ok()?;
    if value.sign() == Sign::NoSign {
        return Some("0".to_string());
    }
    if leading_exponent(&value).abs() > MAX_DECIMAL_EXPONENT {
        return None;
    }
    let value = if value.is_integer() {
        value.with_scale(0)
    } else {
        value.normalized()
    };
    Some(render_plain(&value))
}

/// Power of ten of the leading digit, e.g. 2 for `123`, -3 for `0.001`.
fn leading_exponent(value: &BigDecimal) -> i128 {
    let (_, scale) = value.as_bigint_and_exponent();
    i128::from(value.digits()) - i128::from(scale) - 1
}

fn render_plain(value: &BigDecimal) -> String {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    let mut digits = mantissa.magnitude().to_string();

    if scale <= 0 {
        if mantissa.sign() != Sign::NoSign {
            digits.extend(std::iter::repeat('0').take(scale.unsigned_abs() as usize));
        }
    } else {
        let scale = scale as usize;
        if digits.len() <= scale {
            let pad = scale + 1 - digits.len();
            digits.insert_str(0, &"0".repeat(pad));
        }
        digits.insert(digits.len() - scale, '.');
    }

    if mantissa.sign() == Sign::Minus {
        digits.insert(0, '-');
    }
    digits
}

fn escape_metadata_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Unit metadata line for `metric_name`, or `None` for a blank unit.
pub fn unit_metadata_line(metric_name: &str, unit: &str) -> Option<String> {
    let unit = unit.trim();
    if unit.is_empty() {
        return None;
    }
    Some(format!(
        "#{metric_name} gauge dt.meta.unit=\"{}\"",
        escape_metadata_value(unit)
    ))
}

/// Builds lines for one tenant within one request.
///
/// Unit metadata is emitted at most once per metric name for the lifetime of
/// the builder, so a builder must never be shared across tenants or requests.
#[derive(Debug)]
pub struct MetricsBuilder {
    metric_prefix: Option<String>,
    dims_fragment: String,
    timestamp_ms: Option<i64>,
    metadata_sent: HashSet<String>,
}

impl MetricsBuilder {
    pub fn new(metric_prefix: Option<&str>, dims: &Dimensions, timestamp_ms: Option<i64>) -> Self {
        let dims_fragment = sanitize_dims(dims)
            .iter()
            .map(|(k, v)| format!(",{k}={v}"))
            .collect();

        Self {
            metric_prefix: metric_prefix.map(str::to_string),
            dims_fragment,
            timestamp_ms,
            metadata_sent: HashSet::new(),
        }
    }

    /// Build the line(s) for one metric; empty when the entry is skipped.
    pub fn build_line(&mut self, metric_suffix: &str, raw_value: &str, unit: Option<&str>) -> Vec<String> {
        self.try_build_line(metric_suffix, raw_value, unit)
            .unwrap_or_default()
    }

    /// Like `build_line`, but says why an entry was skipped.
    pub fn try_build_line(
        &mut self,
        metric_suffix: &str,
        raw_value: &str,
        unit: Option<&str>,
    ) -> Result<Vec<String>, SkipReason> {
        let value = format_value(raw_value).ok_or(SkipReason::NotNumeric)?;
        let metric_name = normalise_metric_key(self.metric_prefix.as_deref(), metric_suffix)
            .ok_or(SkipReason::InvalidKey)?;

        let mut lines = Vec::with_capacity(2);

        if let Some(unit) = unit {
            if !self.metadata_sent.contains(&metric_name) {
                if let Some(meta) = unit_metadata_line(&metric_name, unit) {
                    lines.push(meta);
                    self.metadata_sent.insert(metric_name.clone());
                }
            }
        }

        let line = match self.timestamp_ms {
            Some(ts) => format!("{metric_name}{} {value} {ts}", self.dims_fragment),
            None => format!("{metric_name}{} {value}", self.dims_fragment),
        };
        lines.push(line);
        Ok(lines)
    }
}

/// Result of a batch build: lines to send plus the raw keys that were dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineBatch {
    pub lines: Vec<String>,
    pub skipped: Vec<String>,
}

impl LineBatch {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Newline-joined request body.
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

/// Build lines for every entry of `metrics` in insertion order.
///
/// Entries with an illegal key or a non-numeric value land in
/// `LineBatch::skipped`; the batch itself never fails.
pub fn build_lines(
    metrics: &Dimensions,
    metric_prefix: Option<&str>,
    dims: &Dimensions,
    timestamp_ms: Option<i64>,
    unit: Option<&str>,
) -> LineBatch {
    let mut builder = MetricsBuilder::new(metric_prefix, dims, timestamp_ms);
    let mut batch = LineBatch::default();

    for (raw_key, raw_value) in metrics {
        match builder.try_build_line(raw_key, raw_value, unit) {
            Ok(lines) => batch.lines.extend(lines),
            Err(reason) => {
                tracing::debug!(key = %raw_key, ?reason, "metric entry skipped");
                batch.skipped.push(raw_key.clone());
            }
        }
    }
    batch
}
