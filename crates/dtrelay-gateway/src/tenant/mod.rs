//! Tenant registry.
//!
//! Tenants are read once at startup and shared read-only (`Arc`) with every
//! handler; nothing mutates them afterwards.

pub mod registry;

pub use registry::{Tenant, TenantRegistry};
