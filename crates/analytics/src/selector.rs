use spread_watch_core::{
    Instrument, MarketDataError, MarketDataSource, RankField, RankedInstrument, Result,
    TickerSnapshot,
};
use std::sync::Arc;
use tracing::info;

/// Picks the most active instruments quoted in a given asset.
pub struct SymbolSelector<S: ?Sized> {
    source: Arc<S>,
}

impl<S: MarketDataSource + ?Sized> SymbolSelector<S> {
    /// Creates a new symbol selector.
    #[must_use]
    pub const fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Returns up to `n` instruments whose symbol ends with `asset`, ordered by
    /// `rank_field` descending.
    ///
    /// # Errors
    /// Returns an error if the ticker feed cannot be fetched or a matching
    /// row's rank field is not a finite number.
    pub async fn select_top(
        &self,
        asset: &str,
        rank_field: RankField,
        n: usize,
    ) -> Result<Vec<RankedInstrument>> {
        let rows = self.source.fetch_ticker_24h().await?;
        let selected = rank_tickers(&rows, asset, rank_field, n)?;

        info!(
            asset,
            rank_by = %rank_field,
            requested = n,
            selected = selected.len(),
            "Symbol selection complete ({} rows in feed)",
            rows.len()
        );

        Ok(selected)
    }
}

/// Filters `rows` by quote-asset suffix and ranks them by `rank_field`.
///
/// The sort is stable: rows with equal rank values keep their feed order.
/// Fewer than `n` matches returns all of them.
///
/// # Errors
/// Returns `MalformedResponse` if a matching row's rank value does not parse
/// as a finite number.
pub fn rank_tickers(
    rows: &[TickerSnapshot],
    asset: &str,
    rank_field: RankField,
    n: usize,
) -> Result<Vec<RankedInstrument>> {
    let mut ranked = rows
        .iter()
        .filter(|row| row.symbol.ends_with(asset))
        .map(|row| {
            let raw = row.rank_value(rank_field);
            let rank_value = parse_rank_value(raw).ok_or_else(|| {
                MarketDataError::malformed(format!(
                    "{} has non-numeric {rank_field}: {raw:?}",
                    row.symbol
                ))
            })?;
            Ok(RankedInstrument {
                instrument: Instrument::new(row.symbol.clone(), asset),
                rank_field,
                rank_value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Values are finite, so total_cmp agrees with numeric order.
    ranked.sort_by(|a, b| b.rank_value.total_cmp(&a.rank_value));
    ranked.truncate(n);

    Ok(ranked)
}

fn parse_rank_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spread_watch_core::{DepthSnapshot, TopOfBook};

    fn row(symbol: &str, volume: &str, count: &str) -> TickerSnapshot {
        TickerSnapshot {
            symbol: symbol.to_string(),
            volume: volume.to_string(),
            quote_volume: "0".to_string(),
            trade_count: count.to_string(),
        }
    }

    fn feed() -> Vec<TickerSnapshot> {
        vec![
            row("ETHBTC", "500.0", "10"),
            row("BTCUSDT", "900.0", "99"),
            row("LTCBTC", "700.0", "30"),
            row("BNBBTC", "700.0", "20"),
            row("XRPBTC", "100.0", "5"),
            row("WBTC", "50.0", "1"),
        ]
    }

    struct TickerOnlySource {
        rows: Vec<TickerSnapshot>,
    }

    #[async_trait]
    impl MarketDataSource for TickerOnlySource {
        async fn fetch_ticker_24h(&self) -> Result<Vec<TickerSnapshot>> {
            Ok(self.rows.clone())
        }

        async fn fetch_depth(&self, instrument: &Instrument, _levels: usize) -> Result<DepthSnapshot> {
            Err(MarketDataError::unknown_instrument(&instrument.symbol))
        }

        async fn fetch_best_bid_ask(&self, instrument: &Instrument) -> Result<TopOfBook> {
            Err(MarketDataError::unknown_instrument(&instrument.symbol))
        }
    }

    struct DownSource;

    #[async_trait]
    impl MarketDataSource for DownSource {
        async fn fetch_ticker_24h(&self) -> Result<Vec<TickerSnapshot>> {
            Err(MarketDataError::SourceUnavailable("connection refused".to_string()))
        }

        async fn fetch_depth(&self, _instrument: &Instrument, _levels: usize) -> Result<DepthSnapshot> {
            unreachable!()
        }

        async fn fetch_best_bid_ask(&self, _instrument: &Instrument) -> Result<TopOfBook> {
            unreachable!()
        }
    }

    fn symbols(ranked: &[RankedInstrument]) -> Vec<&str> {
        ranked.iter().map(|r| r.instrument.symbol.as_str()).collect()
    }

    // ==================== rank_tickers ====================

    #[test]
    fn test_rank_by_volume_descending() {
        let ranked = rank_tickers(&feed(), "BTC", RankField::Volume, 3).unwrap();

        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.instrument.symbol.ends_with("BTC")));
        assert!(ranked.windows(2).all(|w| w[0].rank_value >= w[1].rank_value));
        assert_eq!(ranked[0].instrument.quote_asset, "BTC");
        assert_eq!(ranked[0].rank_field, RankField::Volume);
    }

    #[test]
    fn test_ties_keep_feed_order() {
        let ranked = rank_tickers(&feed(), "BTC", RankField::Volume, 2).unwrap();
        assert_eq!(symbols(&ranked), vec!["LTCBTC", "BNBBTC"]);
    }

    #[test]
    fn test_rank_by_trade_count() {
        let ranked = rank_tickers(&feed(), "BTC", RankField::TradeCount, 5).unwrap();
        assert_eq!(
            symbols(&ranked),
            vec!["LTCBTC", "BNBBTC", "ETHBTC", "XRPBTC", "WBTC"]
        );
    }

    #[test]
    fn test_fewer_matches_than_requested() {
        let ranked = rank_tickers(&feed(), "USDT", RankField::Volume, 5).unwrap();
        assert_eq!(symbols(&ranked), vec!["BTCUSDT"]);
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let ranked = rank_tickers(&feed(), "EUR", RankField::Volume, 5).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_suffix_match_is_case_sensitive() {
        let ranked = rank_tickers(&feed(), "btc", RankField::Volume, 5).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_zero_requested_is_empty() {
        let ranked = rank_tickers(&feed(), "BTC", RankField::Volume, 0).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_non_numeric_rank_value_is_malformed() {
        let mut rows = feed();
        rows.push(row("DOGEBTC", "lots", "1"));

        let err = rank_tickers(&rows, "BTC", RankField::Volume, 5).unwrap_err();
        assert!(matches!(err, MarketDataError::MalformedResponse(_)));
        assert!(err.to_string().contains("DOGEBTC"));
    }

    #[test]
    fn test_non_numeric_value_outside_filter_is_ignored() {
        let mut rows = feed();
        rows.push(row("DOGEUSDT", "lots", "1"));

        assert!(rank_tickers(&rows, "BTC", RankField::Volume, 5).is_ok());
    }

    #[test]
    fn test_non_finite_rank_value_is_malformed() {
        let rows = vec![row("ETHBTC", "NaN", "1")];
        assert!(rank_tickers(&rows, "BTC", RankField::Volume, 1).is_err());
    }

    // ==================== SymbolSelector ====================

    #[tokio::test]
    async fn test_select_top_uses_source_feed() {
        let selector = SymbolSelector::new(Arc::new(TickerOnlySource { rows: feed() }));
        let ranked = selector.select_top("BTC", RankField::Volume, 2).await.unwrap();

        assert_eq!(symbols(&ranked), vec!["LTCBTC", "BNBBTC"]);
    }

    #[tokio::test]
    async fn test_select_top_propagates_source_error() {
        let source: Arc<dyn MarketDataSource> = Arc::new(DownSource);
        let selector = SymbolSelector::new(source);
        let err = selector.select_top("BTC", RankField::Volume, 2).await.unwrap_err();

        assert!(matches!(err, MarketDataError::SourceUnavailable(_)));
    }
}
