//! Hyperbalance - keeps HyperEVM vaults at a 50/50 value split.
//!
//! Each configured vault holds a base and a quote token. When either side's share of
//! the combined USD value falls to the drift threshold, the vault is rebalanced through
//! Hyperliquid Core, either by swapping the overweight token through USDC
//! (statistical arbitrage) or by bridging so each token sits half on HyperEVM and half
//! on Core (dual bridge).
//!
//! # Modules
//!
//! - [`domain`] - Units, balances, drift decisions, Core actions and execution records
//! - [`port`] - Chain reader/writer and notifier traits
//! - [`application`] - Precision reader, bridge/swap executor, portfolio rebalancer
//! - [`adapter`] - HyperEVM adapter over alloy (requires `hyperevm` feature)
//! - [`app`] - The process loop
//! - [`infrastructure`] - Configuration, logging and the composition root
//! - [`cli`] - Command-line interface (requires `hyperevm` feature)
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `hyperevm` - Enable the alloy-based chain adapter and the binary
//! - `testkit` - Expose the in-memory chain for integration tests

pub mod adapter;
pub mod app;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(feature = "hyperevm")]
pub mod cli;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
