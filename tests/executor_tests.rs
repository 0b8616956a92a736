mod support;

use alloy_primitives::U256;
use hyperbalance::application::BridgeRequest;
use hyperbalance::domain::token::{system_address, GAS_ASSET_SYSTEM_ADDRESS, NATIVE_GAS_TOKEN};
use hyperbalance::domain::CoreAction;
use hyperbalance::error::{BridgeDirection, Error, RebalanceError, SwapStage};
use hyperbalance::testkit::domain::{HYPE_INDEX, USDT0, USDT0_INDEX, VAULT};
use hyperbalance::testkit::SentTransaction;

use support::world::{ether, usdt0, World};

#[tokio::test]
async fn gas_asset_bridge_floors_to_core_precision() {
    let world = World::new();
    let executor = world.executor();
    let amount = ether(1) / U256::from(2u8) + U256::from(123u64);

    let result = executor
        .bridge_to_core(&BridgeRequest::new(NATIVE_GAS_TOKEN, amount))
        .await
        .expect("bridge");

    let floored = ether(1) / U256::from(2u8);
    assert_eq!(result.amount, floored);
    assert_eq!(
        world.chain.sent(),
        [SentTransaction::Native {
            to: GAS_ASSET_SYSTEM_ADDRESS,
            amount: floored,
        }]
    );
    assert_eq!(world.core_hype(), 50_000_000);
}

#[tokio::test]
async fn erc20_bridge_goes_to_system_address() {
    let world = World::new();
    world.fund_usdt0(usdt0(25));

    world
        .executor()
        .bridge_to_core(&BridgeRequest::new(USDT0, usdt0(25)))
        .await
        .expect("bridge");

    assert_eq!(
        world.chain.sent(),
        [SentTransaction::Erc20Transfer {
            token: USDT0,
            to: system_address(USDT0_INDEX),
            amount: usdt0(25),
        }]
    );
    assert_eq!(world.core_usdt0(), 2_500_000_000);
    assert_eq!(world.usdt0(), U256::ZERO);
}

#[tokio::test]
async fn zero_amount_is_rejected_before_sending() {
    let world = World::new();
    let err = world
        .executor()
        .bridge_to_core(&BridgeRequest::new(USDT0, U256::ZERO))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Rebalance(RebalanceError::MissingExecutionParameters(_))
    ));
    assert_eq!(world.chain.transaction_count(), 0);
}

#[tokio::test]
async fn bridge_failure_names_direction() {
    let world = World::new();
    world.fund_usdt0(usdt0(1));
    world.chain.fail_write_at(0);

    let err = world
        .executor()
        .bridge_to_core(&BridgeRequest::new(USDT0, usdt0(1)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Rebalance(RebalanceError::BridgeFailed {
            direction: BridgeDirection::ToCore,
            ..
        })
    ));
}

#[tokio::test]
async fn bridge_to_evm_spot_sends_to_system_address() {
    let world = World::new();
    world.chain.set_core_balance(VAULT, USDT0_INDEX, 1_000_000_000);

    world
        .executor()
        .bridge_to_evm(&BridgeRequest::new(USDT0, usdt0(4)))
        .await
        .expect("bridge");

    let sent = world.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].action_id(), Some(6));
    assert_eq!(world.core_usdt0(), 600_000_000);
    assert_eq!(world.usdt0(), usdt0(4));
}

#[tokio::test]
async fn spot_send_to_self_is_rejected() {
    let world = World::new();
    let err = world
        .executor()
        .spot_send(VAULT, u64::from(HYPE_INDEX), U256::from(1u64))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rebalance(RebalanceError::SelfTransfer(a)) if a == VAULT));
    assert_eq!(world.chain.transaction_count(), 0);
}

#[tokio::test]
async fn sell_order_expects_usdc_at_spot_price() {
    let world = World::new();
    world.chain.set_core_balance(VAULT, HYPE_INDEX, 300_000_000);

    let swap = world
        .executor()
        .swap_asset_to_usdc(NATIVE_GAS_TOKEN, ether(3))
        .await
        .expect("swap");

    // 3 HYPE at $40
    assert_eq!(swap.expected_amount, U256::from(12_000_000_000u64));
    match swap.order {
        CoreAction::LimitOrder {
            asset,
            is_buy,
            limit_px,
            sz,
            ..
        } => {
            assert_eq!(asset, 10_107);
            assert!(!is_buy);
            assert_eq!(limit_px, 3_960_000_000);
            assert_eq!(sz, 300_000_000);
        }
        other => panic!("expected limit order, got {other:?}"),
    }
}

#[tokio::test]
async fn buy_order_is_sized_within_budget() {
    let world = World::new();
    world.chain.set_core_balance(VAULT, 0, 10_000_000_000);

    let swap = world
        .executor()
        .swap_usdc_to_asset(USDT0, U256::from(10_000_000_000u64))
        .await
        .expect("swap");

    // $100 at a 1.01 limit buys 99.00 USDT0
    assert_eq!(swap.expected_amount, U256::from(9_900_000_000u64));
    let status = world
        .executor()
        .check_swap_completed(USDT0, U256::ZERO, swap.expected_amount)
        .await
        .expect("status");
    assert!(status.completed);
    assert_eq!(world.chain.core_balance(VAULT, 0), 100_000_000);
}

#[tokio::test]
async fn unpriced_token_cannot_be_swapped() {
    let world = World::new();
    world.chain.set_spot_px(hyperbalance::testkit::domain::USDT0_SPOT, 0);

    let err = world
        .executor()
        .swap_usdc_to_asset(USDT0, U256::from(1_000_000_000u64))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Rebalance(RebalanceError::SwapFailed {
            stage: SwapStage::UsdcToAsset,
            ..
        })
    ));
}

#[tokio::test]
async fn settlement_gives_up_after_attempts() {
    let world = World::new();
    let err = world
        .executor()
        .wait_for_settlement(USDT0, U256::ZERO, U256::from(100u64))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Rebalance(RebalanceError::SwapNotCompleted { actual, .. }) if actual.is_zero()
    ));
}

#[tokio::test]
async fn management_actions_use_their_ids() {
    let world = World::new();
    let executor = world.executor();

    executor.cancel_order(10_107, 42).await.expect("cancel");
    executor
        .add_api_wallet(system_address(9), "bot")
        .await
        .expect("api wallet");

    let ids: Vec<Option<u32>> = world.chain.sent().iter().map(SentTransaction::action_id).collect();
    assert_eq!(ids, [Some(10), Some(9)]);
}
