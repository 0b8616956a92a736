//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    config
        .logging
        .override_with(args.log_level.as_deref(), args.json_logs);
    config.init_logging();

    info!(
        chain_id = config.network.chain_id,
        targets = config.targets.len(),
        "hyperbalance starting"
    );

    let runner = bootstrap::build_runner(&config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if args.once {
        runner.run_once(shutdown_rx).await?;
        return Ok(());
    }

    let run = runner.run(shutdown_rx);
    tokio::pin!(run);
    tokio::select! {
        result = &mut run => {
            if let Err(e) = result {
                error!(error = %e, "Fatal error");
                return Err(e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received (Ctrl+C)");
            let _ = shutdown_tx.send(true);
            run.await?;
        }
    }

    info!("hyperbalance stopped");
    Ok(())
}
