//! Outbound adapters (driven side).

#[cfg(feature = "hyperevm")]
pub mod hyperevm;
