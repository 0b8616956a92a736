//! Chain-agnostic rebalancing logic: units, balances, decisions and execution records.

pub mod action;
pub mod decision;
pub mod execution;
pub mod portfolio;
pub mod target;
pub mod token;
pub mod units;

pub use action::{spot_asset_id, CoreAction, TimeInForce};
pub use decision::{
    decide, decide_dual_bridge, decide_statistical_arb, Allocation, BridgeLeg, BridgePlan,
    LegDirection, RebalanceDecision, SkipReason, SwapPlan,
};
pub use execution::{
    CompletedStep, ExecutionProgress, ExecutionState, ExecutionStep, GasCheck, RebalanceReport,
    SwapResult, SwapStatus, TransactionResult,
};
pub use portfolio::{Layers, PortfolioSnapshot};
pub use target::{GasConfig, Strategy, TargetConfig, TokenConfig};
pub use token::{SpotBalance, SpotInfo, TokenBalance, TokenInfo, WalletBalance};
