//! Handler for the `analyze` command.

use crate::application::{analyze, Analysis};
use crate::cli::AnalyzeArgs;
use crate::domain::units::usd;
use crate::domain::RebalanceDecision;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Snapshot every target and print the decision. Sends nothing.
pub async fn execute(args: &AnalyzeArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    config.init_logging();

    let reader = bootstrap::build_reader(&config).await?;
    let mut analyses = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        analyses.push(analyze(&reader, target).await);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analyses)?);
    } else {
        for analysis in &analyses {
            print_analysis(analysis);
        }
    }
    Ok(())
}

fn print_analysis(analysis: &Analysis) {
    let snapshot = &analysis.snapshot;
    println!("{} ({})", analysis.target, analysis.strategy);
    println!("  Total value: ${}", snapshot.total_value());
    println!(
        "  Base:  {}% (${})",
        snapshot.base_allocation_percent,
        usd(snapshot.base.value_usd)
    );
    println!(
        "  Quote: {}% (${})",
        snapshot.quote_allocation_percent,
        usd(snapshot.quote.value_usd)
    );
    match &analysis.decision {
        RebalanceDecision::None { reason, .. } => println!("  Decision: none ({reason})"),
        RebalanceDecision::StatisticalArb { plan, .. } => println!(
            "  Decision: sell {} of {} for {} (${})",
            plan.amount_to_rebalance,
            plan.token_to_sell,
            plan.token_to_buy,
            usd(plan.expected_value_usd)
        ),
        RebalanceDecision::DualBridge { plan, .. } => {
            println!("  Decision: bridge (${})", usd(plan.total_value_usd));
            for leg in plan.legs() {
                println!("    {:?} {} of {}", leg.direction, leg.amount, leg.token);
            }
        }
    }
    println!();
}
