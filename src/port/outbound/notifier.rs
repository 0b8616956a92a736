//! Notifier port for rebalancing events.
//!
//! The rebalancer and the process loop report what they decide and do through this
//! trait. Implementations are injected; nothing is global.

use alloy_primitives::B256;
use rust_decimal::Decimal;

use crate::domain::{ExecutionStep, RebalanceDecision, RebalanceReport, Strategy};

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// Drift analysis finished for a target.
    DecisionMade(DecisionEvent),
    /// A transaction of a sequence was mined.
    StepCompleted(StepEvent),
    /// The gas gate stopped a run before any transaction.
    GasPriceRejected {
        target: String,
        observed_gwei: Decimal,
        max_gwei: Decimal,
    },
    /// A sequence ran to the end.
    RebalanceCompleted(RebalanceEvent),
    /// A sequence stopped at a failing step.
    RebalanceFailed(RebalanceEvent),
    /// Every target was visited once.
    CycleCompleted(CycleEvent),
}

/// Drift analysis outcome.
#[derive(Debug, Clone)]
pub struct DecisionEvent {
    pub target: String,
    pub strategy: Strategy,
    pub decision: RebalanceDecision,
}

/// A mined step.
#[derive(Debug, Clone)]
pub struct StepEvent {
    pub target: String,
    pub step: ExecutionStep,
    pub tx_hash: B256,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RebalanceEvent {
    pub target: String,
    pub strategy: Strategy,
    pub steps: usize,
    pub tx_hash: Option<B256>,
    pub unwrapped: bool,
    pub error: Option<String>,
}

impl RebalanceEvent {
    #[must_use]
    pub fn from_report(target: &str, report: &RebalanceReport) -> Self {
        Self {
            target: target.to_string(),
            strategy: report.strategy,
            steps: report.progress.len(),
            tx_hash: report.tx_hash,
            unwrapped: report.unwrapped,
            error: report.error.clone(),
        }
    }
}

/// Totals of one pass over the targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleEvent {
    pub cycle: u64,
    pub targets: usize,
    pub rebalanced: usize,
    pub failed: usize,
}

/// Trait for notification handlers.
///
/// Implementations must return quickly; slow delivery belongs on a spawned task.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        self.notify_all(event);
    }
}

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{info, warn};
        match event {
            Event::DecisionMade(e) => {
                let allocation = e.decision.allocation();
                info!(
                    target_vault = %e.target,
                    strategy = %e.strategy,
                    base = %allocation.base_percent,
                    quote = %allocation.quote_percent,
                    threshold = %allocation.threshold_percent,
                    rebalance = e.decision.needs_rebalance(),
                    "Decision made"
                );
            }
            Event::StepCompleted(e) => {
                info!(
                    target_vault = %e.target,
                    step = %e.step,
                    tx_hash = %e.tx_hash,
                    "Step completed"
                );
            }
            Event::GasPriceRejected {
                target,
                observed_gwei,
                max_gwei,
            } => {
                warn!(
                    target_vault = %target,
                    observed_gwei = %observed_gwei,
                    max_gwei = %max_gwei,
                    "Gas price too high, skipping"
                );
            }
            Event::RebalanceCompleted(e) => {
                info!(
                    target_vault = %e.target,
                    strategy = %e.strategy,
                    steps = e.steps,
                    unwrapped = e.unwrapped,
                    tx_hash = ?e.tx_hash,
                    "Rebalance completed"
                );
            }
            Event::RebalanceFailed(e) => {
                warn!(
                    target_vault = %e.target,
                    strategy = %e.strategy,
                    steps = e.steps,
                    last_hash = ?e.tx_hash,
                    error = e.error.as_deref().unwrap_or("unknown"),
                    "Rebalance failed"
                );
            }
            Event::CycleCompleted(e) => {
                info!(
                    cycle = e.cycle,
                    targets = e.targets,
                    rebalanced = e.rebalanced,
                    failed = e.failed,
                    "Cycle completed"
                );
            }
        }
    }
}
