use super::common::{
    build_client, collect_spreads, instruments_of, load_config, print_spreads, select_with_retry,
    UniverseArgs,
};
use anyhow::Result;
use spread_watch_analytics::SymbolSelector;
use std::sync::Arc;

/// Runs the spreads command: selects the spread universe and prints each
/// symbol's current bid/ask spread once.
///
/// # Errors
/// Returns an error if selection or any best bid/ask fetch fails.
pub async fn run_spreads(config_path: &str, args: UniverseArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = args.resolve(&config.spread_universe);

    let client = build_client(&config.exchange)?;
    let selector = SymbolSelector::new(Arc::clone(&client));
    let ranked = select_with_retry(&selector, &universe, config.selection.max_attempts).await?;

    let books = collect_spreads(client.as_ref(), &instruments_of(&ranked)).await?;
    print_spreads(&books);
    Ok(())
}
