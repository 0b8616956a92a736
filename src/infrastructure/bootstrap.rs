//! Composition root: build the chain adapters and services from configuration.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::hyperevm::{HyperEvmReader, HyperEvmWriter};
use crate::app::Runner;
use crate::application::{BridgeSwapExecutor, PortfolioRebalancer, PrecisionReader};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::{ChainReader, LogNotifier, Notifier, NotifierRegistry};

/// Build the notifier registry. Log output is always on.
pub fn build_notifier_registry(_config: &Config) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// Reader over the read endpoint. Needs no signer.
///
/// # Errors
///
/// Returns an error if the endpoint URL is invalid or the node reports a chain id
/// other than the configured one.
pub async fn build_reader(config: &Config) -> Result<PrecisionReader> {
    let chain: Arc<dyn ChainReader> = Arc::new(HyperEvmReader::connect(
        &config.network.read_rpc_url,
        config.network.token_registry,
    )?);
    let remote = chain.chain_id().await?;
    if remote != config.network.chain_id {
        return Err(ConfigError::InvalidValue {
            field: "chain_id",
            reason: format!(
                "configured {} but {} reports {remote}",
                config.network.chain_id, config.network.read_rpc_url
            ),
        }
        .into());
    }
    info!(chain_id = remote, rpc = %config.network.read_rpc_url, "Connected to HyperEVM");
    Ok(PrecisionReader::new(chain, remote))
}

/// Rebalancer signing with `WALLET_PRIVATE_KEY` over the broadcast endpoint.
///
/// # Errors
///
/// Returns an error if the key is missing or invalid, or the reader cannot be built.
pub async fn build_rebalancer(config: &Config, notifier: Arc<dyn Notifier>) -> Result<PortfolioRebalancer> {
    let reader = build_reader(config).await?;
    let writer = HyperEvmWriter::connect(
        &config.network.broadcast_rpc_url,
        config.private_key()?,
        config.network.chain_id,
    )?;
    info!(wallet = %crate::port::ChainWriter::address(&writer), "Signer loaded");
    let executor = BridgeSwapExecutor::new(reader, Arc::new(writer), config.scheduler.settlement());
    Ok(PortfolioRebalancer::new(executor, notifier))
}

/// Fully wired process loop.
///
/// # Errors
///
/// Returns an error if the rebalancer cannot be built.
pub async fn build_runner(config: &Config) -> Result<Runner> {
    let notifier: Arc<dyn Notifier> = Arc::new(build_notifier_registry(config));
    let rebalancer = build_rebalancer(config, Arc::clone(&notifier)).await?;
    Ok(Runner::new(
        rebalancer,
        config.targets.clone(),
        config.gas.clone(),
        &config.scheduler,
        notifier,
    ))
}
