//! dt-relay core: line-protocol primitives, key normalization, and error types.
//!
//! This crate turns raw form input into ingest lines for the metrics API. It
//! carries no transport or runtime dependencies so the gateway, tests, and
//! tooling can share the exact same formatting rules.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input is either skipped (reported back to the caller) or
//! surfaced as `RelayError`, never a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ClientCode, RelayError, Result};
pub use protocol::Dimensions;
