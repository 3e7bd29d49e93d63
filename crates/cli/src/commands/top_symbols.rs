use super::common::{build_client, load_config, print_top_symbols, select_with_retry, UniverseArgs};
use anyhow::Result;
use spread_watch_analytics::SymbolSelector;

/// Runs the top-symbols command. Defaults come from the spread universe.
///
/// # Errors
/// Returns an error if configuration loading or symbol selection fails.
pub async fn run_top_symbols(config_path: &str, args: UniverseArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = args.resolve(&config.spread_universe);

    let client = build_client(&config.exchange)?;
    let selector = SymbolSelector::new(client);
    let ranked = select_with_retry(&selector, &universe, config.selection.max_attempts).await?;

    print_top_symbols(&universe, &ranked);
    Ok(())
}
