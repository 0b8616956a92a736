//! HyperEVM adapter built on alloy.

mod contracts;
mod reader;
mod writer;

pub use reader::HyperEvmReader;
pub use writer::HyperEvmWriter;
