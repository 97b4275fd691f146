//! Dynamic form arrays into key/value maps.

use super::Dimensions;

/// Zip parallel key/value sequences into a map.
///
/// Keys are trimmed; pairs with a blank key or a missing/empty value are
/// dropped. Duplicate keys follow map semantics: the last value wins.
///
/// ```
/// use dtrelay_core::protocol::extract_pairs;
///
/// let pairs = extract_pairs([Some("a"), Some(""), None, Some("b")], ["1", "2", "3", "4"]);
/// assert_eq!(pairs.len(), 2);
/// assert_eq!(pairs["a"], "1");
/// assert_eq!(pairs["b"], "4");
/// ```
pub fn extract_pairs<'a, K, V>(
    keys: impl IntoIterator<Item = K>,
    values: impl IntoIterator<Item = V>,
) -> Dimensions
where
    K: Into<Option<&'a str>>,
    V: Into<Option<&'a str>>,
{
    let mut pairs = Dimensions::new();
    for (key, value) in keys.into_iter().zip(values) {
        let key = key.into().unwrap_or_default().trim();
        if key.is_empty() {
            continue;
        }
        match value.into() {
            Some(value) if !value.is_empty() => {
                pairs.insert(key.to_string(), value.to_string());
            }
            _ => {}
        }
    }
    pairs
}
