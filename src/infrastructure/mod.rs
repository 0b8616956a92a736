//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root wiring the HyperEVM adapter into the services
//! - [`config`] - Configuration loading and validation

#[cfg(feature = "hyperevm")]
pub mod bootstrap;
pub mod config;
