//! Testable seams over `std` for TrogonStack projects.
//!
//! | Concern | Trait | Production | Test |
//! |---------|-------|------------|------|
//! | Env vars | [`ReadEnv`] | [`SystemEnv`] | [`InMemoryEnv`]* |
//!
//! *Available with `#[cfg(test)]` or the `"test-support"` feature.
//!
//! [`InMemoryEnv`] is backed by a `Mutex`, so it can be shared with
//! `#[tokio::test(flavor = "multi_thread")]` tests and spawned tasks.

pub mod env;

#[cfg(any(test, feature = "test-support"))]
pub use env::InMemoryEnv;
pub use env::{ReadEnv, SystemEnv};
