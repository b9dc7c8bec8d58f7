//! Top-level facade crate for usersvc.
//!
//! Re-exports the core model, the HTTP service, and the conformance suite so
//! users can depend on a single crate.

pub mod core {
    pub use usersvc_core::*;
}

pub mod server {
    pub use usersvc_server::*;
}

pub mod conformance {
    pub use usersvc_conformance::*;
}
