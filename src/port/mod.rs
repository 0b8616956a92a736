//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! - [`ChainReader`], [`ChainWriter`] - HyperEVM RPC and Core precompiles
//! - [`Notifier`] - Event notifications

pub mod outbound;

pub use outbound::chain::{precompile, ChainReader, ChainWriter, CORE_WRITER, DEFAULT_TOKEN_REGISTRY};
pub use outbound::notifier::{
    CycleEvent, DecisionEvent, Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier,
    RebalanceEvent, StepEvent,
};
