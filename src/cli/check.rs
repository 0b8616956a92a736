//! Handler for the `check` command.

use std::path::Path;

use crate::adapter::outbound::hyperevm::HyperEvmWriter;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::port::ChainWriter;

/// Validate configuration, then probe the read endpoint without sending anything.
pub async fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;
    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Chain ID: {}", config.network.chain_id);
    println!("  Read RPC: {}", config.network.read_rpc_url);
    println!("  Broadcast RPC: {}", config.network.broadcast_rpc_url);
    println!("  Max gas price: {} gwei", config.gas.max_gas_price_gwei);
    println!("  Gas reserve: {}", config.gas.gas_reserve);
    println!("  Targets: {}", config.targets.len());
    println!();

    let signer = match config.wallet.private_key.as_deref() {
        Some(key) => {
            let writer = HyperEvmWriter::connect(&config.network.broadcast_rpc_url, key, config.network.chain_id)?;
            println!("✓ Wallet private key found (from WALLET_PRIVATE_KEY env var)");
            println!("  Signer: {}", writer.address());
            Some(writer.address())
        }
        None => {
            println!("⚠ No wallet private key configured");
            println!("  Set WALLET_PRIVATE_KEY environment variable to run");
            None
        }
    };

    let reader = bootstrap::build_reader(&config).await?;
    println!("✓ RPC reachable, chain ID matches");

    let gas = reader.gas_price_gwei().await?;
    if gas <= config.gas.max_gas_price_gwei {
        println!("✓ Gas price {gas} gwei (ceiling {})", config.gas.max_gas_price_gwei);
    } else {
        println!(
            "⚠ Gas price {gas} gwei is above the ceiling {}; rebalancing would be skipped",
            config.gas.max_gas_price_gwei
        );
    }
    println!();

    for target in &config.targets {
        println!("{} ({})", target.label(), target.strategy());
        match reader.core_user_exists(target.vault_address).await {
            Ok(true) => println!("  ✓ Vault has a Core account"),
            Ok(false) => println!("  ⚠ Vault has no Core account yet"),
            Err(e) => println!("  ⚠ Core account lookup failed: {e}"),
        }
        if let Some(signer) = signer {
            if signer == target.vault_address {
                println!("  ✓ Signer matches vault");
            } else {
                println!("  ✗ Signer does not match vault {}", target.vault_address);
            }
        }
    }

    println!();
    println!("Configuration is ready to use.");
    Ok(())
}
