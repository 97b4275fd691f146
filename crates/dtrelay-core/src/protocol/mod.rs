//! Line-protocol modules.
//!
//! - `key`: metric / dimension key normalization.
//! - `dims`: dimension value escaping, sanitizing, and merging.
//! - `line`: value formatting and line assembly (`MetricsBuilder`).
//! - `pairs`: dynamic form arrays into metric / dimension maps.
//! - `storage`: the fixed storage-array field catalogue.
//!
//! Every function here is total: input that cannot be expressed on the wire
//! is dropped and reported, never sent half-formed.

pub mod dims;
pub mod key;
pub mod line;
pub mod pairs;
pub mod storage;

use indexmap::IndexMap;

/// Ordered key/value map used for dimensions and metric pairs.
pub type Dimensions = IndexMap<String, String>;

pub use dims::{escape_dimension, merge_dimensions, sanitize_dims};
pub use key::{is_valid_key, normalise_dimension_key, normalise_metric_key};
pub use line::{build_lines, format_value, LineBatch, MetricsBuilder, SkipReason};
pub use pairs::extract_pairs;
