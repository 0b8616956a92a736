//! Application entry point: the loop that keeps every vault in balance.

mod runner;

pub use runner::Runner;
