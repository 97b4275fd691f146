//! In-process operational metrics.
//!
//! Counters and histograms live in atomics behind `DashMap` and are rendered
//! in the Prometheus text format by the `/metrics/` handler.

pub mod metrics;
