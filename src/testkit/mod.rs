//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`chain`]: [`InMemoryChain`](chain::InMemoryChain), a scripted chain implementing
//!   both [`ChainReader`](crate::port::ChainReader) and [`ChainWriter`](crate::port::ChainWriter).
//! - [`domain`]: Builders for token metadata and targets, plus a seeded market world.

pub mod chain;
pub mod domain;

pub use chain::{InMemoryChain, SentTransaction};
