//! Black-box conformance suite for the users HTTP API.
//!
//! Drives a running service over HTTP through the ordered cases in
//! [`suite::CASES`] and produces a [`report::Report`] whose exit code reflects
//! the outcome.

pub mod client;
pub mod error;
pub mod exposition;
pub mod report;
pub mod suite;

pub use client::{UserView, UsersClient};
pub use error::{ConformanceError, Result};
pub use exposition::Exposition;
pub use report::{Outcome, Report};
pub use suite::{Suite, SuiteConfig};
