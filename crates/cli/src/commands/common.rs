//! Plumbing shared by the commands: config loading, client construction,
//! selection retries and console tables.

use anyhow::{Context, Result};
use clap::Args;
use spread_watch_analytics::SymbolSelector;
use spread_watch_binance::{BinanceClient, BinanceClientConfig};
use spread_watch_core::{
    AppConfig, ConfigLoader, ExchangeConfig, Instrument, MarketDataSource, NotionalTotals,
    RankField, RankedInstrument, TopOfBook, UniverseConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Universe overrides shared by the one-shot commands.
#[derive(Args, Debug, Clone, Default)]
pub struct UniverseArgs {
    /// Quote asset suffix to filter symbols by (e.g., "USDT", "BTC")
    #[arg(long)]
    pub asset: Option<String>,

    /// 24h ticker field to rank by: volume, quoteVolume or count
    #[arg(long)]
    pub rank_by: Option<RankField>,

    /// Number of symbols to select
    #[arg(long)]
    pub count: Option<usize>,
}

impl UniverseArgs {
    /// Applies the flags that were given on top of `base`.
    #[must_use]
    pub fn resolve(&self, base: &UniverseConfig) -> UniverseConfig {
        UniverseConfig {
            asset: self.asset.clone().unwrap_or_else(|| base.asset.clone()),
            rank_by: self.rank_by.unwrap_or(base.rank_by),
            count: self.count.unwrap_or(base.count),
        }
    }
}

/// Loads and validates the configuration file at `path`.
pub fn load_config(path: &str) -> Result<AppConfig> {
    let config = ConfigLoader::load_from(path)?;
    info!(
        path,
        base_url = %config.exchange.base_url,
        "Configuration loaded"
    );
    Ok(config)
}

/// Builds the rate-limited exchange client.
pub fn build_client(config: &ExchangeConfig) -> Result<Arc<BinanceClient>> {
    let client = BinanceClient::new(BinanceClientConfig::from(config))
        .context("failed to create Binance client")?;
    Ok(Arc::new(client))
}

/// Runs symbol selection, retrying transient failures up to `max_attempts`
/// times using the delay each error suggests.
pub async fn select_with_retry<S>(
    selector: &SymbolSelector<S>,
    universe: &UniverseConfig,
    max_attempts: u32,
) -> Result<Vec<RankedInstrument>>
where
    S: MarketDataSource + ?Sized,
{
    let mut attempt = 1;
    loop {
        match selector
            .select_top(&universe.asset, universe.rank_by, universe.count)
            .await
        {
            Ok(selected) => return Ok(selected),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = e.retry_delay_secs().unwrap_or(1);
                warn!(
                    asset = %universe.asset,
                    attempt,
                    max_attempts,
                    delay_secs = delay,
                    error = %e,
                    "Symbol selection failed, retrying"
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "failed to select top {} {} symbols by {} after {} attempt(s)",
                        universe.count, universe.asset, universe.rank_by, attempt
                    )
                });
            }
        }
    }
}

/// Fetches the current best bid/ask of each instrument in order.
///
/// One-shot: the first failure aborts.
pub async fn collect_spreads<S>(source: &S, instruments: &[Instrument]) -> Result<Vec<TopOfBook>>
where
    S: MarketDataSource + ?Sized,
{
    let mut books = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        let book = source
            .fetch_best_bid_ask(instrument)
            .await
            .with_context(|| format!("failed to fetch best bid/ask for {instrument}"))?;
        books.push(book);
    }
    Ok(books)
}

#[must_use]
pub fn instruments_of(ranked: &[RankedInstrument]) -> Vec<Instrument> {
    ranked.iter().map(|r| r.instrument.clone()).collect()
}

// =============================================================================
// Console output
// =============================================================================

pub fn print_top_symbols(universe: &UniverseConfig, ranked: &[RankedInstrument]) {
    println!(
        "\n=== Top {} {} symbols by {} ===\n",
        universe.count, universe.asset, universe.rank_by
    );
    if ranked.is_empty() {
        println!("  (no symbols matched)");
        return;
    }
    println!("  {:>3}  {:<16} {:>14}", "#", "Symbol", universe.rank_by.as_str());
    for (i, r) in ranked.iter().enumerate() {
        println!(
            "  {:>3}  {:<16} {:>14}",
            i + 1,
            r.instrument.symbol,
            format_rank_value(r.rank_value)
        );
    }
}

pub fn print_notional(top_levels: usize, totals: &[(String, NotionalTotals)]) {
    println!("\n=== Notional value of top {top_levels} levels ===\n");
    println!("  {:<16} {:>20} {:>20}", "Symbol", "Bids", "Asks");
    for (symbol, t) in totals {
        println!(
            "  {:<16} {:>20.8} {:>20.8}",
            symbol, t.bids_notional, t.asks_notional
        );
    }
}

pub fn print_spreads(books: &[TopOfBook]) {
    println!("\n=== Bid/ask spreads ===\n");
    println!("  {:<16} {:>16} {:>16} {:>14}", "Symbol", "Bid", "Ask", "Spread");
    for book in books {
        println!(
            "  {:<16} {:>16.8} {:>16.8} {:>14.8}",
            book.symbol,
            book.bid_price,
            book.ask_price,
            book.spread()
        );
    }
}

/// Compact rendering of large rank values (volumes, trade counts).
#[must_use]
pub fn format_rank_value(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spread_watch_core::{DepthSnapshot, MarketDataError, TickerSnapshot};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Ticker feed that fails with `error` for the first `failures` calls.
    struct FlakySource {
        failures: u32,
        error: fn() -> MarketDataError,
        calls: AtomicU32,
    }

    impl FlakySource {
        fn new(failures: u32, error: fn() -> MarketDataError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for FlakySource {
        async fn fetch_ticker_24h(&self) -> spread_watch_core::Result<Vec<TickerSnapshot>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error)());
            }
            Ok(vec![
                TickerSnapshot {
                    symbol: "ETHUSDT".to_string(),
                    volume: "10".to_string(),
                    quote_volume: "10".to_string(),
                    trade_count: "200".to_string(),
                },
                TickerSnapshot {
                    symbol: "BTCUSDT".to_string(),
                    volume: "5".to_string(),
                    quote_volume: "50".to_string(),
                    trade_count: "300".to_string(),
                },
            ])
        }

        async fn fetch_depth(
            &self,
            instrument: &Instrument,
            _levels: usize,
        ) -> spread_watch_core::Result<DepthSnapshot> {
            Err(MarketDataError::unknown_instrument(&instrument.symbol))
        }

        async fn fetch_best_bid_ask(
            &self,
            instrument: &Instrument,
        ) -> spread_watch_core::Result<TopOfBook> {
            if instrument.symbol == "BTCUSDT" {
                Ok(TopOfBook::new("BTCUSDT", 100.0, 100.5))
            } else {
                Err(MarketDataError::unknown_instrument(&instrument.symbol))
            }
        }
    }

    fn universe() -> UniverseConfig {
        UniverseConfig {
            asset: "USDT".to_string(),
            rank_by: RankField::TradeCount,
            count: 5,
        }
    }

    // ==================== UniverseArgs ====================

    #[test]
    fn test_universe_args_override_only_given_fields() {
        let args = UniverseArgs {
            asset: Some("BTC".to_string()),
            rank_by: None,
            count: Some(2),
        };
        let resolved = args.resolve(&universe());

        assert_eq!(resolved.asset, "BTC");
        assert_eq!(resolved.rank_by, RankField::TradeCount);
        assert_eq!(resolved.count, 2);
        assert_eq!(UniverseArgs::default().resolve(&universe()), universe());
    }

    // ==================== Selection retry ====================

    #[tokio::test(start_paused = true)]
    async fn test_selection_retries_transient_errors() {
        let source = Arc::new(FlakySource::new(2, || MarketDataError::rate_limited(3)));
        let selector = SymbolSelector::new(Arc::clone(&source));

        let ranked = select_with_retry(&selector, &universe(), 3).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(ranked[0].instrument.symbol, "BTCUSDT");
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_gives_up_after_max_attempts() {
        let source = Arc::new(FlakySource::new(10, || {
            MarketDataError::SourceUnavailable("down".to_string())
        }));
        let selector = SymbolSelector::new(Arc::clone(&source));

        let err = select_with_retry(&selector, &universe(), 3).await.unwrap_err();

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("after 3 attempt(s)"));
    }

    #[tokio::test]
    async fn test_selection_does_not_retry_permanent_errors() {
        let source = Arc::new(FlakySource::new(10, || MarketDataError::malformed("bad feed")));
        let selector = SymbolSelector::new(Arc::clone(&source));

        assert!(select_with_retry(&selector, &universe(), 3).await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    // ==================== One-shot spreads ====================

    #[tokio::test]
    async fn test_collect_spreads_aborts_on_first_failure() {
        let source = FlakySource::new(0, || MarketDataError::malformed("unused"));

        let books = collect_spreads(&source, &[Instrument::new("BTCUSDT", "USDT")])
            .await
            .unwrap();
        assert!((books[0].spread() - 0.5).abs() < f64::EPSILON);

        let err = collect_spreads(
            &source,
            &[
                Instrument::new("BTCUSDT", "USDT"),
                Instrument::new("NOPEUSDT", "USDT"),
            ],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("NOPEUSDT"));
    }

    // ==================== Formatting ====================

    #[test]
    fn test_format_rank_value() {
        assert_eq!(format_rank_value(999.0), "999.00");
        assert_eq!(format_rank_value(1_500.0), "1.50K");
        assert_eq!(format_rank_value(2_500_000.0), "2.50M");
        assert_eq!(format_rank_value(3_000_000_000.0), "3.00B");
    }
}
