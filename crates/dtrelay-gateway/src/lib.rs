//! dt-relay gateway library entry.
//!
//! Wires configuration, the tenant registry, the outbound ingest client and
//! the two form-driven ingest apps into one axum service. Used by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod apps;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod obs;
pub mod ops;
pub mod router;
pub mod tenant;
pub mod views;
