//! Portfolio snapshots, drift decisions and execution of the resulting plan.
//!
//! A run goes `Idle -> [Unwrap] -> BridgeOut -> Swap(s) -> BridgeBack -> [Wrap] -> Done`
//! for statistical arbitrage, or through up to four bridge legs for the dual-bridge
//! strategy. The first failing step stops the run; completed steps are kept as they are.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::executor::{BridgeRequest, BridgeSwapExecutor};
use super::reader::PrecisionReader;
use crate::domain::decision::{decide, BridgePlan, LegDirection, SwapPlan};
use crate::domain::token::{NATIVE_GAS_TOKEN, WRAPPED_GAS_TOKEN};
use crate::domain::{
    ExecutionProgress, ExecutionState, ExecutionStep, GasCheck, GasConfig, Layers,
    PortfolioSnapshot, RebalanceDecision, RebalanceReport, Strategy, TargetConfig,
};
use crate::error::{Error, RebalanceError, Result};
use crate::port::{DecisionEvent, Event, Notifier, RebalanceEvent, StepEvent};

/// Snapshot and the decision taken from it.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub target: String,
    pub strategy: Strategy,
    pub snapshot: PortfolioSnapshot,
    pub decision: RebalanceDecision,
}

/// Drives one target from snapshot to executed plan.
pub struct PortfolioRebalancer {
    reader: PrecisionReader,
    executor: BridgeSwapExecutor,
    notifier: Arc<dyn Notifier>,
}

impl PortfolioRebalancer {
    #[must_use]
    pub fn new(executor: BridgeSwapExecutor, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            reader: executor.reader().clone(),
            executor,
            notifier,
        }
    }

    /// Signing wallet.
    #[must_use]
    pub fn wallet(&self) -> Address {
        self.executor.address()
    }

    /// Value the vault's base and quote holdings, reading both concurrently.
    pub async fn portfolio_snapshot(&self, target: &TargetConfig, layers: Layers) -> PortfolioSnapshot {
        portfolio_snapshot(&self.reader, target, layers).await
    }

    /// Observed gas price against the configured ceiling.
    pub async fn check_gas_price(&self, gas: &GasConfig) -> Result<GasCheck> {
        let observed_gwei = self.reader.gas_price_gwei().await?;
        Ok(GasCheck {
            acceptable: observed_gwei <= gas.max_gas_price_gwei,
            observed_gwei,
            max_gwei: gas.max_gas_price_gwei,
        })
    }

    /// Snapshot valued for the target's strategy and the decision it leads to.
    pub async fn analyze(&self, target: &TargetConfig) -> Analysis {
        analyze(&self.reader, target).await
    }

    pub async fn calculate_rebalance_decision(&self, target: &TargetConfig) -> RebalanceDecision {
        self.analyze(target).await.decision
    }

    /// The signer must be the vault whose balances are rebalanced.
    pub fn ensure_wallet(&self, target: &TargetConfig) -> Result<()> {
        let wallet = self.wallet();
        if wallet != target.vault_address {
            return Err(RebalanceError::WalletConfigurationError(format!(
                "signer {wallet} does not match vault {} of {}",
                target.vault_address, target.vault_name
            ))
            .into());
        }
        Ok(())
    }

    /// Gas gate, decision, gas-reserve unwrap, then the strategy's sequence.
    ///
    /// # Errors
    ///
    /// Returns an error when the wallet does not match the vault, when the gas price
    /// cannot be read or exceeds the ceiling. Failures inside the sequence are carried
    /// in the report.
    #[instrument(skip_all, fields(vault = %target.label()))]
    pub async fn perform_complete_rebalancing(
        &self,
        target: &TargetConfig,
        gas: &GasConfig,
    ) -> Result<RebalanceReport> {
        self.ensure_wallet(target)?;
        let label = target.label();
        let strategy = target.strategy();

        let gas_check = self.check_gas_price(gas).await?;
        if !gas_check.acceptable {
            self.notifier.notify(Event::GasPriceRejected {
                target: label,
                observed_gwei: gas_check.observed_gwei,
                max_gwei: gas_check.max_gwei,
            });
            return Err(RebalanceError::GasPriceTooHigh {
                observed_gwei: gas_check.observed_gwei,
                max_gwei: gas_check.max_gwei,
            }
            .into());
        }

        let decision = self.calculate_rebalance_decision(target).await;
        self.notifier.notify(Event::DecisionMade(DecisionEvent {
            target: label.clone(),
            strategy,
            decision: decision.clone(),
        }));
        if !decision.needs_rebalance() {
            if let RebalanceDecision::None { reason, .. } = &decision {
                info!(reason = %reason, "No rebalance needed");
            }
            return Ok(RebalanceReport::skipped(
                strategy,
                gas_check.observed_gwei,
                Some(decision),
            ));
        }

        let mut run = Run::new(&label, self.notifier.as_ref());
        let mut unwrapped = false;
        let mut outcome: StepResult<()> = Ok(());
        if target.uses_wrapped_gas_asset() {
            match self.unwrap_gas_reserve(gas, &mut run).await {
                Ok(done) => unwrapped = done,
                Err(failure) => outcome = Err(failure),
            }
        }

        if outcome.is_ok() {
            outcome = match &decision {
                RebalanceDecision::StatisticalArb { plan, .. } => {
                    self.execute_statistical_arb(plan, &mut run).await
                }
                RebalanceDecision::DualBridge { plan, .. } => {
                    self.execute_dual_bridge(plan, &mut run).await
                }
                RebalanceDecision::None { .. } => Ok(()),
            };
        }

        let progress = run.progress;
        let last_hash = progress.last_hash();
        let (state, error) = match outcome {
            Ok(()) => (ExecutionState::Done, None),
            Err(StepFailure { step, error }) => {
                warn!(step = %step, error = %error, last_hash = ?last_hash, "Step failed");
                let message = error.to_string();
                (
                    ExecutionState::Failed {
                        step,
                        error: message.clone(),
                        last_hash,
                    },
                    Some(message),
                )
            }
        };

        let report = RebalanceReport {
            success: error.is_none(),
            tx_hash: last_hash,
            decision: Some(decision),
            gas_price_gwei: gas_check.observed_gwei,
            unwrapped,
            strategy,
            state,
            progress,
            error,
        };

        let event = RebalanceEvent::from_report(&label, &report);
        if report.success {
            self.notifier.notify(Event::RebalanceCompleted(event));
        } else {
            self.notifier.notify(Event::RebalanceFailed(event));
        }
        Ok(report)
    }

    /// Top the native balance up to the reserve from the wrapped balance.
    async fn unwrap_gas_reserve(&self, gas: &GasConfig, run: &mut Run<'_>) -> StepResult<bool> {
        let wallet = self.wallet();
        let reserve = gas.reserve_wei();
        let native = self.reader.evm_balance(wallet, NATIVE_GAS_TOKEN).await;
        if native >= reserve {
            return Ok(false);
        }
        let wrapped = self.reader.evm_balance(wallet, WRAPPED_GAS_TOKEN).await;
        let amount = (reserve - native).min(wrapped);
        if amount.is_zero() {
            warn!(native = %native, reserve = %reserve, "Below gas reserve with nothing to unwrap");
            return Ok(false);
        }

        let step = ExecutionStep::Unwrap { amount };
        let tx = self.executor.unwrap(amount).await.at(step)?;
        run.complete(step, tx.tx_hash);
        info!(amount = %amount, "Gas reserve topped up");
        Ok(true)
    }

    async fn execute_statistical_arb(&self, plan: &SwapPlan, run: &mut Run<'_>) -> StepResult<()> {
        let sell = plan.token_to_sell;
        let buy = plan.token_to_buy;
        let amount = plan.amount_to_rebalance;
        info!(
            sell = %sell,
            buy = %buy,
            amount = %amount,
            value_usd = %crate::domain::units::usd(plan.expected_value_usd),
            "Executing statistical arbitrage"
        );

        if sell == WRAPPED_GAS_TOKEN {
            let step = ExecutionStep::Unwrap { amount };
            let tx = self.executor.unwrap(amount).await.at(step)?;
            run.complete(step, tx.tx_hash);
        }

        // Core wei of `sell` now on Core
        let step = ExecutionStep::BridgeOut { token: sell, amount };
        let baseline = self.executor.core_wei(sell).await.at(step)?;
        let bridged = self
            .executor
            .bridge_to_core(&BridgeRequest::new(sell, amount))
            .await
            .at(step)?;
        run.complete(step, bridged.tx_hash);
        let expected = self.reader.evm_to_wei(sell, bridged.amount).await.at(step)?;
        let on_core = self
            .executor
            .wait_for_settlement(sell, baseline, expected)
            .await
            .at(step)?
            .received;

        // USDC wei available for the buy
        let sell_step = ExecutionStep::SwapToUsdc {
            token: sell,
            amount: bridged.amount,
        };
        let usdc = if self.executor.is_usdc(sell).await.at(sell_step)? {
            on_core
        } else {
            let step = sell_step;
            let baseline = self.executor.usdc_wei().await.at(step)?;
            let swap = self
                .executor
                .swap_asset_to_usdc(sell, bridged.amount)
                .await
                .at(step)?;
            run.complete(step, swap.tx_hash);
            self.executor
                .wait_for_usdc(baseline, swap.expected_amount)
                .await
                .at(step)?
                .received
        };

        // Core wei of `buy` to bring back
        let buy_step = ExecutionStep::SwapFromUsdc {
            token: buy,
            amount: usdc,
        };
        let bought = if self.executor.is_usdc(buy).await.at(buy_step)? {
            usdc
        } else {
            let step = buy_step;
            let baseline = self.executor.core_wei(buy).await.at(step)?;
            let swap = self.executor.swap_usdc_to_asset(buy, usdc).await.at(step)?;
            run.complete(step, swap.tx_hash);
            self.executor
                .wait_for_settlement(buy, baseline, swap.expected_amount)
                .await
                .at(step)?
                .received
        };

        let step = ExecutionStep::BridgeBack {
            token: buy,
            amount: bought,
        };
        let back = self.reader.wei_to_evm(buy, bought).await.at(step)?;
        self.bridge_back(buy, back, ExecutionStep::BridgeBack { token: buy, amount: back }, run)
            .await
    }

    async fn execute_dual_bridge(&self, plan: &BridgePlan, run: &mut Run<'_>) -> StepResult<()> {
        let legs = plan.legs();
        info!(
            legs = legs.len(),
            value_usd = %crate::domain::units::usd(plan.total_value_usd),
            "Executing dual bridge"
        );

        for leg in legs {
            let step = ExecutionStep::Bridge {
                token: leg.token,
                direction: leg.direction,
                amount: leg.amount,
            };
            match leg.direction {
                LegDirection::ToCore => {
                    if leg.token == WRAPPED_GAS_TOKEN {
                        let unwrap = ExecutionStep::Unwrap { amount: leg.amount };
                        let tx = self.executor.unwrap(leg.amount).await.at(unwrap)?;
                        run.complete(unwrap, tx.tx_hash);
                    }
                    let tx = self
                        .executor
                        .bridge_to_core(&BridgeRequest::new(leg.token, leg.amount))
                        .await
                        .at(step)?;
                    run.complete(step, tx.tx_hash);
                }
                LegDirection::ToEvm => self.bridge_back(leg.token, leg.amount, step, run).await?,
            }
        }
        Ok(())
    }

    /// Bridge `amount` of `token` to HyperEVM, re-wrapping when the vault holds the
    /// wrapped gas asset.
    async fn bridge_back(
        &self,
        token: Address,
        amount: U256,
        step: ExecutionStep,
        run: &mut Run<'_>,
    ) -> StepResult<()> {
        let wallet = self.wallet();
        let native_before = if token == WRAPPED_GAS_TOKEN {
            Some(self.reader.evm_balance(wallet, NATIVE_GAS_TOKEN).await)
        } else {
            None
        };

        let tx = self
            .executor
            .bridge_to_evm(&BridgeRequest::new(token, amount))
            .await
            .at(step)?;
        run.complete(step, tx.tx_hash);

        if let Some(baseline) = native_before {
            let received = self
                .executor
                .wait_for_evm_credit(NATIVE_GAS_TOKEN, baseline, amount)
                .await
                .at(ExecutionStep::Wrap { amount })?
                .received
                .min(amount);
            let step = ExecutionStep::Wrap { amount: received };
            let tx = self.executor.wrap(received).await.at(step)?;
            run.complete(step, tx.tx_hash);
        }
        Ok(())
    }
}

/// Value the vault's base and quote holdings on `layers`.
pub async fn portfolio_snapshot(
    reader: &PrecisionReader,
    target: &TargetConfig,
    layers: Layers,
) -> PortfolioSnapshot {
    let include_core = layers == Layers::Both;
    let vault = target.vault_address;
    let (base, quote) = tokio::join!(
        reader.token_balance(vault, target.base_token.address, include_core),
        reader.token_balance(vault, target.quote_token.address, include_core),
    );
    PortfolioSnapshot::new(base, quote, layers, Utc::now())
}

/// Snapshot on the layers the target's strategy balances, and the decision taken.
/// Needs no signer.
pub async fn analyze(reader: &PrecisionReader, target: &TargetConfig) -> Analysis {
    let strategy = target.strategy();
    let layers = match strategy {
        Strategy::StatisticalArb => Layers::Evm,
        Strategy::DualBridge => Layers::Both,
    };
    let snapshot = portfolio_snapshot(reader, target, layers).await;
    let decision = decide(&snapshot, target);
    Analysis {
        target: target.label(),
        strategy,
        snapshot,
        decision,
    }
}

/// Completed steps of the run in progress.
struct Run<'a> {
    label: &'a str,
    notifier: &'a dyn Notifier,
    progress: ExecutionProgress,
}

impl<'a> Run<'a> {
    fn new(label: &'a str, notifier: &'a dyn Notifier) -> Self {
        Self {
            label,
            notifier,
            progress: ExecutionProgress::new(),
        }
    }

    fn complete(&mut self, step: ExecutionStep, tx_hash: B256) {
        self.progress.record(step, tx_hash);
        self.notifier.notify(Event::StepCompleted(StepEvent {
            target: self.label.to_string(),
            step,
            tx_hash,
        }));
    }
}

struct StepFailure {
    step: ExecutionStep,
    error: Error,
}

type StepResult<T> = std::result::Result<T, StepFailure>;

trait AtStep<T> {
    fn at(self, step: ExecutionStep) -> StepResult<T>;
}

impl<T> AtStep<T> for Result<T> {
    fn at(self, step: ExecutionStep) -> StepResult<T> {
        self.map_err(|error| StepFailure { step, error })
    }
}
