//! The process loop: visit every target, pause, repeat until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::application::PortfolioRebalancer;
use crate::domain::{GasConfig, TargetConfig};
use crate::error::{Error, RebalanceError, Result};
use crate::infrastructure::config::scheduler::SchedulerConfig;
use crate::port::{CycleEvent, Event, Notifier};

/// Sequential rebalancing of the configured targets.
pub struct Runner {
    rebalancer: PortfolioRebalancer,
    targets: Vec<TargetConfig>,
    gas: GasConfig,
    cycle_interval: Duration,
    target_pause: Duration,
    notifier: Arc<dyn Notifier>,
}

impl Runner {
    #[must_use]
    pub fn new(
        rebalancer: PortfolioRebalancer,
        targets: Vec<TargetConfig>,
        gas: GasConfig,
        scheduler: &SchedulerConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            rebalancer,
            targets,
            gas,
            cycle_interval: scheduler.cycle_interval(),
            target_pause: scheduler.target_pause(),
            notifier,
        }
    }

    /// Run cycles until `shutdown` flips to `true` or a fatal error occurs.
    /// Returns the number of completed cycles.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: bad configuration or a signer that does not match
    /// a vault.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<u64> {
        info!(
            targets = self.targets.len(),
            cycle_interval_secs = self.cycle_interval.as_secs(),
            "Rebalancer started"
        );

        let mut completed = 0u64;
        loop {
            if *shutdown.borrow() {
                break;
            }
            let Some(summary) = self.run_cycle(completed + 1, &mut shutdown).await? else {
                break;
            };
            completed += 1;
            self.notifier.notify(Event::CycleCompleted(summary));

            if !pause(self.cycle_interval, &mut shutdown).await {
                break;
            }
        }

        info!(cycles = completed, "Rebalancer stopped");
        Ok(completed)
    }

    /// Run a single cycle and report it, without pausing afterwards.
    ///
    /// # Errors
    ///
    /// Returns fatal errors only.
    pub async fn run_once(&self, mut shutdown: watch::Receiver<bool>) -> Result<Option<CycleEvent>> {
        let summary = self.run_cycle(1, &mut shutdown).await?;
        if let Some(ref summary) = summary {
            self.notifier.notify(Event::CycleCompleted(summary.clone()));
        }
        Ok(summary)
    }

    /// Visit every target once. `None` when shutdown interrupted the cycle.
    ///
    /// # Errors
    ///
    /// Returns fatal errors only; everything else is logged and counted.
    pub async fn run_cycle(
        &self,
        cycle: u64,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Option<CycleEvent>> {
        let mut summary = CycleEvent {
            cycle,
            targets: self.targets.len(),
            ..CycleEvent::default()
        };

        for (i, target) in self.targets.iter().enumerate() {
            if i > 0 && !pause(self.target_pause, shutdown).await {
                return Ok(None);
            }

            match self
                .rebalancer
                .perform_complete_rebalancing(target, &self.gas)
                .await
            {
                Ok(report) if !report.success => summary.failed += 1,
                Ok(report) if report.executed() => summary.rebalanced += 1,
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    error!(vault = %target.label(), error = %e, "Fatal error, stopping");
                    return Err(e);
                }
                Err(Error::Rebalance(RebalanceError::GasPriceTooHigh { .. })) => {}
                Err(e) => {
                    warn!(vault = %target.label(), error = %e, "Rebalance attempt failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(Some(summary))
    }
}

/// Sleep for `duration`. Returns `false` if shutdown was requested meanwhile.
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => !*shutdown.borrow(),
        result = shutdown.changed() => {
            match result {
                Ok(()) if *shutdown.borrow() => {
                    info!("Shutdown signal received");
                    false
                }
                Ok(()) => true,
                Err(_) => {
                    info!("Shutdown channel closed");
                    false
                }
            }
        }
    }
}
