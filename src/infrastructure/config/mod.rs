//! Infrastructure configuration modules.

pub mod logging;
pub mod network;
pub mod scheduler;
pub mod settings;
pub mod wallet;
