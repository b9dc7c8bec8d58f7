//! usersvc core: user model, validation, storage seam and the error surface.
//!
//! This crate is shared by the HTTP service and any other process that needs
//! to reason about user records. It carries no transport or runtime
//! dependencies.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `UsersError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod store;

pub use error::{ClientCode, Result, UsersError};
pub use model::{NewUser, User, UserInput};
pub use store::{MemoryStore, UserStore};
