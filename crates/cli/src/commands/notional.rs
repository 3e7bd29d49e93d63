use super::common::{
    build_client, instruments_of, load_config, print_notional, print_top_symbols,
    select_with_retry, UniverseArgs,
};
use anyhow::{Context, Result};
use clap::Args;
use spread_watch_analytics::{NotionalAggregator, SymbolSelector};
use std::sync::Arc;

/// Arguments for the notional command.
#[derive(Args, Debug, Clone, Default)]
pub struct NotionalArgs {
    #[command(flatten)]
    pub universe: UniverseArgs,

    /// Number of largest levels per side to sum (defaults to notional.top_levels)
    #[arg(long)]
    pub levels: Option<usize>,
}

/// Runs the notional command. Defaults come from the notional universe.
///
/// # Errors
/// Returns an error if selection or any depth fetch fails.
pub async fn run_notional(config_path: &str, args: NotionalArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = args.universe.resolve(&config.notional_universe);
    let top_levels = args.levels.unwrap_or(config.notional.top_levels);
    if top_levels == 0 {
        anyhow::bail!("--levels must be greater than zero");
    }

    let client = build_client(&config.exchange)?;
    let selector = SymbolSelector::new(Arc::clone(&client));
    let ranked = select_with_retry(&selector, &universe, config.selection.max_attempts).await?;
    print_top_symbols(&universe, &ranked);

    let aggregator = NotionalAggregator::new(client);
    let totals = aggregator
        .total_notional_for(&instruments_of(&ranked), top_levels)
        .await
        .context("failed to aggregate order book notional")?;
    print_notional(top_levels, &totals);
    Ok(())
}
