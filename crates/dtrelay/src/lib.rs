//! Top-level facade crate for dt-relay.
//!
//! Re-exports the protocol core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use dtrelay_core::*;
}

pub mod gateway {
    pub use dtrelay_gateway::*;
}
