mod support;

use alloy_primitives::U256;
use hyperbalance::domain::token::{NATIVE_GAS_TOKEN, WRAPPED_GAS_TOKEN};
use hyperbalance::error::{Error, RebalanceError};
use hyperbalance::testkit::domain::{
    raw_px, token_info, HYPE_INDEX, USDT0, USDT0_INDEX, USDT0_SPOT, VAULT,
};
use rust_decimal_macros::dec;

use support::world::{ether, usdt0, World};

#[tokio::test]
async fn gas_asset_resolves_to_network_index() {
    let world = World::new();
    let reader = world.reader();

    assert_eq!(reader.token_index(WRAPPED_GAS_TOKEN).await.unwrap(), HYPE_INDEX);
    assert_eq!(reader.token_index(NATIVE_GAS_TOKEN).await.unwrap(), HYPE_INDEX);
    assert_eq!(reader.token_index(USDT0).await.unwrap(), USDT0_INDEX);
}

#[tokio::test]
async fn spot_price_is_scaled_to_eight_decimals() {
    let world = World::new();
    let reader = world.reader();

    assert_eq!(reader.spot_price(WRAPPED_GAS_TOKEN).await, U256::from(4_000_000_000u64));
    assert_eq!(reader.spot_price(USDT0).await, U256::from(100_000_000u64));
}

#[tokio::test]
async fn usd_market_is_chosen_among_several() {
    let world = World::new();
    // USDT0 also trades against HYPE on spot 200; the USDC market must win
    world.chain.list_token(
        USDT0_INDEX,
        USDT0,
        token_info("USDT0", 2, 8, -2, &[200, u64::from(USDT0_SPOT)], USDT0),
    );
    world
        .chain
        .list_spot(200, "@200", [u64::from(USDT0_INDEX), u64::from(HYPE_INDEX)], raw_px(3, 2));

    let reader = world.reader();
    assert_eq!(reader.spot_index(USDT0).await.unwrap(), USDT0_SPOT);
    assert_eq!(reader.spot_price(USDT0).await, U256::from(100_000_000u64));
}

#[tokio::test]
async fn missing_usd_market_is_an_error() {
    let world = World::new();
    world.chain.list_token(
        USDT0_INDEX,
        USDT0,
        token_info("USDT0", 2, 8, -2, &[200, 201], USDT0),
    );
    world
        .chain
        .list_spot(200, "@200", [u64::from(USDT0_INDEX), u64::from(HYPE_INDEX)], 1);
    world
        .chain
        .list_spot(201, "@201", [u64::from(USDT0_INDEX), 5], 1);

    let err = world.reader().spot_index(USDT0).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Rebalance(RebalanceError::NoUsdMarketFound { token_index }) if token_index == USDT0_INDEX
    ));
    // valuation degrades instead of failing
    assert_eq!(world.reader().spot_price(USDT0).await, U256::ZERO);
}

#[tokio::test]
async fn core_balance_is_converted_to_evm_units() {
    let world = World::new();
    world.chain.set_core_balance(VAULT, HYPE_INDEX, 150_000_000);
    world.chain.set_core_balance(VAULT, USDT0_INDEX, 250_000_000);
    let reader = world.reader();

    assert_eq!(
        reader.core_balance(VAULT, WRAPPED_GAS_TOKEN).await,
        U256::from(1_500_000_000_000_000_000u128)
    );
    assert_eq!(reader.core_balance(VAULT, USDT0).await, U256::from(2_500_000u64));
}

#[tokio::test]
async fn token_balance_values_both_layers() {
    let world = World::new();
    world.fund_whype(ether(10));
    world.chain.set_core_balance(VAULT, HYPE_INDEX, 500_000_000);
    let reader = world.reader();

    let evm_only = reader.token_balance(VAULT, WRAPPED_GAS_TOKEN, false).await;
    assert_eq!(evm_only.value_usd, U256::from(40_000_000_000u64));

    let both = reader.token_balance(VAULT, WRAPPED_GAS_TOKEN, true).await;
    assert_eq!(both.balance.total_balance(), ether(15));
    assert_eq!(both.value_usd, U256::from(60_000_000_000u64));
}

#[tokio::test]
async fn failing_reads_degrade_to_zero() {
    let world = World::new();
    world.fund_usdt0(usdt0(100));
    world.chain.set_failing_reads(true);
    let reader = world.reader();

    assert_eq!(reader.evm_balance(VAULT, USDT0).await, U256::ZERO);
    assert_eq!(reader.core_balance(VAULT, USDT0).await, U256::ZERO);
    assert_eq!(reader.spot_price(USDT0).await, U256::ZERO);
    assert!(matches!(
        reader.spot_balance(VAULT, USDT0).await,
        Err(Error::Rebalance(RebalanceError::PrecompileReadFailure { .. }))
    ));
}

#[tokio::test]
async fn unknown_decimals_default_to_eighteen() {
    let world = World::new();
    let reader = world.reader();

    assert_eq!(reader.decimals(USDT0).await, 6);
    assert_eq!(reader.decimals(NATIVE_GAS_TOKEN).await, 18);
    assert_eq!(reader.decimals(VAULT).await, 18);
}

#[tokio::test]
async fn gas_price_is_reported_in_gwei() {
    let world = World::new();
    world.chain.set_gas_price_gwei(12);

    assert_eq!(world.reader().gas_price_gwei().await.unwrap(), dec!(12));
}

#[tokio::test]
async fn precision_conversions_follow_token_metadata() {
    let world = World::new();
    let reader = world.reader();

    // USDT0: 6 EVM decimals, 8 wei decimals, 2 sz decimals
    let wei = reader.evm_to_wei(USDT0, usdt0(3)).await.unwrap();
    assert_eq!(wei, U256::from(300_000_000u64));
    assert_eq!(reader.wei_to_evm(USDT0, wei).await.unwrap(), usdt0(3));
    assert_eq!(reader.wei_to_sz(USDT0, wei).await.unwrap(), U256::from(300u64));
    assert_eq!(reader.sz_to_wei(USDT0, U256::from(300u64)).await.unwrap(), wei);
}

#[tokio::test]
async fn core_user_exists_reflects_core_account() {
    let world = World::new();
    let reader = world.reader();
    assert!(!reader.core_user_exists(VAULT).await.unwrap());

    world.chain.add_core_user(VAULT);
    assert!(reader.core_user_exists(VAULT).await.unwrap());
}
