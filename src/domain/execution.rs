//! Execution sequencing, per-operation outcomes and the final report.

use alloy_primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use serde::Serialize;

use super::action::CoreAction;
use super::decision::{LegDirection, RebalanceDecision};
use super::target::Strategy;

/// One step of a rebalancing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ExecutionStep {
    /// Wrapped gas asset to native before it can be bridged.
    Unwrap { amount: U256 },
    /// Sell token moved from HyperEVM to Core.
    BridgeOut { token: Address, amount: U256 },
    SwapToUsdc { token: Address, amount: U256 },
    SwapFromUsdc { token: Address, amount: U256 },
    /// Bought token moved from Core back to HyperEVM.
    BridgeBack { token: Address, amount: U256 },
    /// Native gas asset back into its wrapped form.
    Wrap { amount: U256 },
    /// One leg of a dual-bridge plan.
    Bridge {
        token: Address,
        direction: LegDirection,
        amount: U256,
    },
}

impl ExecutionStep {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unwrap { .. } => "unwrap",
            Self::BridgeOut { .. } => "bridge_out",
            Self::SwapToUsdc { .. } => "swap_to_usdc",
            Self::SwapFromUsdc { .. } => "swap_from_usdc",
            Self::BridgeBack { .. } => "bridge_back",
            Self::Wrap { .. } => "wrap",
            Self::Bridge {
                direction: LegDirection::ToCore,
                ..
            } => "bridge_to_core",
            Self::Bridge {
                direction: LegDirection::ToEvm,
                ..
            } => "bridge_to_evm",
        }
    }
}

impl std::fmt::Display for ExecutionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A completed step and the transaction that carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedStep {
    pub step: ExecutionStep,
    pub tx_hash: B256,
}

/// Steps completed so far in one sequence, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionProgress {
    completed: Vec<CompletedStep>,
}

impl ExecutionProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: ExecutionStep, tx_hash: B256) {
        self.completed.push(CompletedStep { step, tx_hash });
    }

    #[must_use]
    pub fn completed(&self) -> &[CompletedStep] {
        &self.completed
    }

    /// Hash of the most recent successful transaction.
    #[must_use]
    pub fn last_hash(&self) -> Option<B256> {
        self.completed.last().map(|c| c.tx_hash)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

/// Where a sequence ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExecutionState {
    Idle,
    Done,
    /// Earlier steps stay applied; nothing is rolled back.
    Failed {
        step: ExecutionStep,
        error: String,
        last_hash: Option<B256>,
    },
}

/// Outcome of a transaction-producing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    pub tx_hash: B256,
    pub amount: U256,
}

/// Outcome of submitting one swap order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapResult {
    pub tx_hash: B256,
    /// Core wei of the output token expected once the order fills.
    pub expected_amount: U256,
    pub order: CoreAction,
}

/// Settlement progress of a swap, measured on the output token's Core balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapStatus {
    pub completed: bool,
    pub current_balance: U256,
    /// Balance increase over the pre-swap baseline.
    pub received: U256,
    pub pending_amount: U256,
}

/// Observed gas price against the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasCheck {
    pub acceptable: bool,
    pub observed_gwei: Decimal,
    pub max_gwei: Decimal,
}

/// Everything one `perform_complete_rebalancing` call did.
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceReport {
    pub success: bool,
    /// Last transaction sent, if any.
    pub tx_hash: Option<B256>,
    pub decision: Option<RebalanceDecision>,
    pub gas_price_gwei: Decimal,
    /// Whether gas reserve was unwrapped before dispatch.
    pub unwrapped: bool,
    pub strategy: Strategy,
    pub state: ExecutionState,
    pub progress: ExecutionProgress,
    pub error: Option<String>,
}

impl RebalanceReport {
    /// Report for a run that stopped before sending anything.
    #[must_use]
    pub fn skipped(strategy: Strategy, gas_price_gwei: Decimal, decision: Option<RebalanceDecision>) -> Self {
        Self {
            success: true,
            tx_hash: None,
            decision,
            gas_price_gwei,
            unwrapped: false,
            strategy,
            state: ExecutionState::Idle,
            progress: ExecutionProgress::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn executed(&self) -> bool {
        !self.progress.is_empty()
    }
}
