//! Application services: reader, executor and rebalancer, leaf first.

pub mod executor;
pub mod reader;
pub mod rebalancer;

pub use executor::{BridgeRequest, BridgeSwapExecutor, SettlementPolicy};
pub use reader::PrecisionReader;
pub use rebalancer::{analyze, portfolio_snapshot, Analysis, PortfolioRebalancer};
