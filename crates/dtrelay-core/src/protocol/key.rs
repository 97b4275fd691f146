//! Metric and dimension key normalization.
//!
//! A legal key matches `^[A-Za-z][A-Za-z0-9_.:-]*$`. Normalization never
//! rescues a digit-led key by prefixing it: such keys are rejected and the
//! caller skips the field.

const KEY_PUNCT: [char; 4] = ['_', '.', ':', '-'];

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || KEY_PUNCT.contains(&ch)
}

/// Whether `key` is already wire-legal.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars.all(is_key_char),
        _ => false,
    }
}

/// Shared cleanup for metric and dimension keys.
///
/// Trims, maps whitespace and every other illegal char to `_`, collapses
/// `_` runs, then strips `_.:-` from both ends.
fn normalise_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut cleaned = String::with_capacity(trimmed.len());
    let mut last_underscore = false;

    for ch in trimmed.chars() {
        let mapped = if is_key_char(ch) { ch } else { '_' };
        if mapped == '_' {
            if last_underscore {
                continue;
            }
            last_underscore = true;
        } else {
            last_underscore = false;
        }
        cleaned.push(mapped);
    }

    let cleaned = cleaned.trim_matches(&KEY_PUNCT[..]);
    if cleaned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        Some(cleaned.to_string())
    } else {
        None
    }
}

/// Normalize a dimension key. `None` means the field must be skipped.
pub fn normalise_dimension_key(raw_key: &str) -> Option<String> {
    normalise_key(raw_key).filter(|key| is_valid_key(key))
}

/// Normalize a metric key and attach `metric_prefix` unless the key already
/// carries it.
///
/// ```
/// use dtrelay_core::protocol::normalise_metric_key;
///
/// assert_eq!(
///     normalise_metric_key(Some("custom.fs"), "used bytes").as_deref(),
///     Some("custom.fs.used_bytes"),
/// );
/// assert_eq!(
///     normalise_metric_key(Some("custom.fs"), "custom.fs.used").as_deref(),
///     Some("custom.fs.used"),
/// );
/// ```
pub fn normalise_metric_key(metric_prefix: Option<&str>, raw_key: &str) -> Option<String> {
    let suffix = normalise_key(raw_key)?;

    let candidate = match metric_prefix.and_then(normalise_key) {
        Some(prefix) if suffix.starts_with(&prefix) => suffix,
        Some(prefix) => format!("{prefix}.{suffix}"),
        None => suffix,
    };

    is_valid_key(&candidate).then_some(candidate)
}
