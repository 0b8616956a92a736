mod support;

use alloy_primitives::{B256, U256};
use hyperbalance::domain::token::{system_address, GAS_ASSET_SYSTEM_ADDRESS, WRAPPED_GAS_TOKEN};
use hyperbalance::domain::{
    ExecutionState, ExecutionStep, GasConfig, LegDirection, RebalanceDecision, SkipReason,
};
use hyperbalance::error::{Error, RebalanceError};
use hyperbalance::port::Event;
use hyperbalance::testkit::domain::{target, HYPE_INDEX, USDT0, USDT0_INDEX, USDT0_SPOT, VAULT};
use hyperbalance::testkit::SentTransaction;
use rust_decimal_macros::dec;

use support::world::{ether, usdt0, World};

fn hash(n: u64) -> B256 {
    B256::left_padding_from(&n.to_be_bytes())
}

/// $800 of WHYPE against $200 of USDT0.
fn overweight_whype() -> World {
    let world = World::new();
    world.fund_whype(ether(20));
    world.fund_usdt0(usdt0(200));
    world
}

#[tokio::test]
async fn statistical_arb_runs_full_sequence() {
    let world = overweight_whype();
    let rebalancer = world.rebalancer();
    let target = target(dec!(40), dec!(10), true);

    let report = rebalancer
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("rebalance");

    assert!(report.success, "unexpected failure: {:?}", report.error);
    assert_eq!(report.state, ExecutionState::Done);
    assert!(!report.unwrapped);
    match report.decision {
        Some(RebalanceDecision::StatisticalArb { ref plan, .. }) => {
            assert_eq!(plan.token_to_sell, WRAPPED_GAS_TOKEN);
            assert_eq!(plan.token_to_buy, USDT0);
            assert_eq!(plan.amount_to_rebalance, U256::from(7_500_000_000_000_000_000u128));
        }
        ref other => panic!("expected statistical arb, got {other:?}"),
    }

    let steps: Vec<&str> = report
        .progress
        .completed()
        .iter()
        .map(|c| c.step.name())
        .collect();
    assert_eq!(
        steps,
        ["unwrap", "bridge_out", "swap_to_usdc", "swap_from_usdc", "bridge_back"]
    );
    assert_eq!(report.tx_hash, Some(hash(5)));

    let sent = world.chain.sent();
    assert_eq!(sent.len(), 5);
    assert!(matches!(sent[0], SentTransaction::Unwrap { .. }));
    assert!(matches!(sent[1], SentTransaction::Native { to, .. } if to == GAS_ASSET_SYSTEM_ADDRESS));
    assert_eq!(sent[2].action_id(), Some(1));
    assert_eq!(sent[3].action_id(), Some(1));
    assert_eq!(sent[4].action_id(), Some(6));

    // 7.5 WHYPE sold at $40, 297.02 USDT0 bought at a 1.01 limit
    assert_eq!(world.whype(), ether(20) - U256::from(7_500_000_000_000_000_000u128));
    assert_eq!(world.usdt0(), U256::from(497_020_000u64));
    assert_eq!(world.core_hype(), 0);
    assert_eq!(world.core_usdt0(), 0);
    assert_eq!(world.native(), ether(1));
}

#[tokio::test]
async fn statistical_arb_notifies_each_step() {
    let world = overweight_whype();
    let target = target(dec!(40), dec!(10), true);

    world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("rebalance");

    assert_eq!(world.notifier.count(|e| matches!(e, Event::DecisionMade(_))), 1);
    assert_eq!(world.notifier.count(|e| matches!(e, Event::StepCompleted(_))), 5);
    assert_eq!(
        world
            .notifier
            .count(|e| matches!(e, Event::RebalanceCompleted(r) if r.steps == 5)),
        1
    );
}

#[tokio::test]
async fn gas_price_above_ceiling_sends_nothing() {
    let world = overweight_whype();
    world.chain.set_gas_price_gwei(75);
    let target = target(dec!(40), dec!(10), true);

    let result = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await;

    match result {
        Err(Error::Rebalance(RebalanceError::GasPriceTooHigh {
            observed_gwei,
            max_gwei,
        })) => {
            assert_eq!(observed_gwei, dec!(75));
            assert_eq!(max_gwei, dec!(50));
        }
        other => panic!("expected gas rejection, got {other:?}"),
    }
    assert_eq!(world.chain.transaction_count(), 0);
    assert_eq!(
        world
            .notifier
            .count(|e| matches!(e, Event::GasPriceRejected { .. })),
        1
    );
}

#[tokio::test]
async fn balanced_vault_is_skipped() {
    let world = World::new();
    world.fund_whype(ether(10));
    world.fund_usdt0(usdt0(400));
    let target = target(dec!(40), dec!(10), true);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("skip");

    assert!(report.success);
    assert!(!report.executed());
    assert_eq!(report.state, ExecutionState::Idle);
    assert!(matches!(
        report.decision,
        Some(RebalanceDecision::None {
            reason: SkipReason::WithinThreshold,
            ..
        })
    ));
    assert_eq!(world.chain.transaction_count(), 0);
}

#[tokio::test]
async fn failed_step_keeps_earlier_transactions() {
    let world = overweight_whype();
    // unwrap and bridge succeed, the sell order cannot be submitted
    world.chain.fail_write_at(2);
    let target = target(dec!(40), dec!(10), true);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("report");

    assert!(!report.success);
    assert_eq!(report.progress.len(), 2);
    assert_eq!(report.tx_hash, Some(hash(2)));
    match &report.state {
        ExecutionState::Failed {
            step, last_hash, ..
        } => {
            assert!(matches!(step, ExecutionStep::SwapToUsdc { .. }));
            assert_eq!(*last_hash, Some(hash(2)));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    // bridged HYPE stays on Core
    assert_eq!(world.core_hype(), 750_000_000);
    assert_eq!(
        world
            .notifier
            .count(|e| matches!(e, Event::RebalanceFailed(r) if r.tx_hash == Some(hash(2)))),
        1
    );
}

#[tokio::test]
async fn unfilled_order_times_out() {
    let world = overweight_whype();
    world.chain.set_fill_orders(false);
    let target = target(dec!(40), dec!(10), true);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("report");

    assert!(!report.success);
    assert_eq!(report.progress.len(), 3);
    assert!(report
        .error
        .as_deref()
        .is_some_and(|e| e.contains("not completed")));
}

#[tokio::test]
async fn signer_must_be_the_vault() {
    let world = World::signed_by(system_address(7));
    world.fund_whype(ether(20));
    let target = target(dec!(40), dec!(10), true);

    let err = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect_err("wallet mismatch");

    assert!(matches!(
        err,
        Error::Rebalance(RebalanceError::WalletConfigurationError(_))
    ));
    assert!(err.is_fatal());
    assert_eq!(world.chain.transaction_count(), 0);
}

#[tokio::test]
async fn gas_reserve_is_unwrapped_first() {
    let world = overweight_whype();
    world.chain.set_native_balance(VAULT, U256::ZERO);
    let target = target(dec!(40), dec!(10), true);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("rebalance");

    assert!(report.success, "unexpected failure: {:?}", report.error);
    assert!(report.unwrapped);
    let reserve = U256::from(100_000_000_000_000_000u64);
    assert_eq!(
        report.progress.completed()[0].step,
        ExecutionStep::Unwrap { amount: reserve }
    );
    assert_eq!(world.native(), reserve);
}

#[tokio::test]
async fn dual_bridge_splits_each_token_across_layers() {
    let world = World::new();
    world.fund_whype(ether(20));
    world
        .chain
        .set_core_balance(VAULT, USDT0_INDEX, 100_000_000_000);
    // $800 WHYPE on HyperEVM, $1000 USDT0 on Core: 44.44 / 55.56
    let target = target(dec!(45), dec!(10), false);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("rebalance");

    assert!(report.success, "unexpected failure: {:?}", report.error);
    let steps: Vec<ExecutionStep> = report.progress.completed().iter().map(|c| c.step).collect();
    assert_eq!(
        steps,
        [
            ExecutionStep::Unwrap { amount: ether(10) },
            ExecutionStep::Bridge {
                token: WRAPPED_GAS_TOKEN,
                direction: LegDirection::ToCore,
                amount: ether(10),
            },
            ExecutionStep::Bridge {
                token: USDT0,
                direction: LegDirection::ToEvm,
                amount: usdt0(500),
            },
        ]
    );

    assert_eq!(world.whype(), ether(10));
    assert_eq!(world.core_hype(), 1_000_000_000);
    assert_eq!(world.usdt0(), usdt0(500));
    assert_eq!(world.core_usdt0(), 50_000_000_000);
}

#[tokio::test]
async fn dual_bridge_back_to_evm_rewraps_gas_asset() {
    let world = World::new();
    // all HYPE on Core, all USDT0 on HyperEVM
    world
        .chain
        .set_core_balance(VAULT, HYPE_INDEX, 2_000_000_000);
    world.fund_usdt0(usdt0(1000));
    let target = target(dec!(45), dec!(10), false);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("rebalance");

    assert!(report.success, "unexpected failure: {:?}", report.error);
    let names: Vec<&str> = report
        .progress
        .completed()
        .iter()
        .map(|c| c.step.name())
        .collect();
    assert_eq!(names, ["bridge_to_evm", "wrap", "bridge_to_core"]);
    assert_eq!(world.whype(), ether(10));
    assert_eq!(world.native(), ether(1));
    assert_eq!(world.core_hype(), 1_000_000_000);
    assert_eq!(world.usdt0(), usdt0(500));
}

#[tokio::test]
async fn unreadable_quote_price_blocks_the_trade() {
    let world = World::new();
    world.fund_whype(ether(10));
    world.fund_usdt0(usdt0(400));
    world.chain.set_spot_px(USDT0_SPOT, 0);

    for statistical_arb in [true, false] {
        let report = world
            .rebalancer()
            .perform_complete_rebalancing(&target(dec!(40), dec!(10), statistical_arb), &GasConfig::default())
            .await
            .expect("skip");

        assert!(!report.executed());
        assert!(matches!(
            report.decision,
            Some(RebalanceDecision::None {
                reason: SkipReason::PriceUnavailable { token },
                ..
            }) if token == USDT0
        ));
    }
    assert_eq!(world.chain.transaction_count(), 0);
}

#[tokio::test]
async fn rewrap_uses_the_amount_actually_received() {
    let world = World::new();
    world.chain.set_core_balance(VAULT, HYPE_INDEX, 2_000_000_000);
    world.fund_usdt0(usdt0(1000));
    // 99.5% of the bridged gas asset arrives
    world.chain.set_evm_credit_fee_bps(50);
    let target = target(dec!(45), dec!(10), false);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("rebalance");

    assert!(report.success, "unexpected failure: {:?}", report.error);
    let received = U256::from(9_950_000_000_000_000_000u128);
    assert_eq!(
        report.progress.completed()[1].step,
        ExecutionStep::Wrap { amount: received }
    );
    assert_eq!(world.whype(), received);
    // the gas reserve is untouched
    assert_eq!(world.native(), ether(1));
}

#[tokio::test]
async fn buy_side_lookup_failure_is_tagged_with_the_buy_swap() {
    let world = overweight_whype();
    // unwrap, bridge and sell succeed; the buy token can no longer be resolved
    world.chain.set_registry_outage_after(3);
    let target = target(dec!(40), dec!(10), true);

    let report = world
        .rebalancer()
        .perform_complete_rebalancing(&target, &GasConfig::default())
        .await
        .expect("report");

    assert!(!report.success);
    assert_eq!(report.progress.len(), 3);
    match &report.state {
        ExecutionState::Failed { step, .. } => {
            assert!(matches!(step, ExecutionStep::SwapFromUsdc { token, .. } if *token == USDT0));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}
