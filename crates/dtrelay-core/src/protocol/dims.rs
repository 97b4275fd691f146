//! Dimension encoding.
//!
//! Only values are escaped; keys go through `normalise_dimension_key`.

use super::key::normalise_dimension_key;
use super::Dimensions;

/// Escape a dimension value for the line protocol.
pub fn escape_dimension(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ',' => escaped.push_str("\\,"),
            ' ' => escaped.push_str("\\ "),
            '=' => escaped.push_str("\\="),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Drop empty values and illegal keys, normalize the rest and escape values.
///
/// When two raw keys normalize to the same key the later value wins and the
/// key keeps the position of its first occurrence.
pub fn sanitize_dims(values: &Dimensions) -> Dimensions {
    let mut sanitized = Dimensions::with_capacity(values.len());
    for (raw_key, raw_value) in values {
        if raw_value.is_empty() {
            continue;
        }
        let Some(key) = normalise_dimension_key(raw_key) else {
            continue;
        };
        sanitized.insert(key, escape_dimension(raw_value));
    }
    sanitized
}

/// Fold dimension layers left to right. Later layers win, but an empty value
/// never overwrites anything.
pub fn merge_dimensions(layers: &[&Dimensions]) -> Dimensions {
    let mut merged = Dimensions::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            if !value.is_empty() {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}
