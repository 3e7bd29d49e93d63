//! Order book notional aggregation.
//!
//! For each side of a book, the notional of a level is `price * quantity`.
//! The aggregate for a side is the sum of its `top_levels` largest level
//! notionals, which is not necessarily the sum of the levels nearest the
//! touch.

use spread_watch_core::{Instrument, MarketDataSource, NotionalTotals, PriceLevel, Result};
use std::sync::Arc;
use tracing::debug;

/// Sums the largest level notionals of an instrument's order book.
pub struct NotionalAggregator<S: ?Sized> {
    source: Arc<S>,
}

impl<S: MarketDataSource + ?Sized> NotionalAggregator<S> {
    #[must_use]
    pub const fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Fetches the book for `instrument` and sums the `top_levels` largest
    /// notionals of each side independently.
    ///
    /// # Errors
    /// Returns an error if the depth fetch fails.
    pub async fn total_notional(
        &self,
        instrument: &Instrument,
        top_levels: usize,
    ) -> Result<NotionalTotals> {
        let depth = self.source.fetch_depth(instrument, top_levels).await?;

        let totals = NotionalTotals {
            bids_notional: side_notional(&depth.bids, top_levels),
            asks_notional: side_notional(&depth.asks, top_levels),
        };

        debug!(
            symbol = %instrument.symbol,
            bid_levels = depth.bids.len(),
            ask_levels = depth.asks.len(),
            bids_notional = totals.bids_notional,
            asks_notional = totals.asks_notional,
            "Aggregated book notional"
        );

        Ok(totals)
    }

    /// Runs [`Self::total_notional`] for each instrument in order. The result
    /// keeps the order of `instruments`.
    ///
    /// # Errors
    /// Returns the first fetch error; no partial result is returned.
    pub async fn total_notional_for(
        &self,
        instruments: &[Instrument],
        top_levels: usize,
    ) -> Result<Vec<(String, NotionalTotals)>> {
        let mut totals = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            let side_totals = self.total_notional(instrument, top_levels).await?;
            totals.push((instrument.symbol.clone(), side_totals));
        }
        Ok(totals)
    }
}

/// Sum of the `top_levels` largest `price * quantity` values in `levels`.
///
/// An empty side, or `top_levels == 0`, sums to exactly `0.0`.
#[must_use]
pub fn side_notional(levels: &[PriceLevel], top_levels: usize) -> f64 {
    let mut notionals: Vec<f64> = levels.iter().map(PriceLevel::notional).collect();
    notionals.sort_by(|a, b| b.total_cmp(a));
    notionals.iter().take(top_levels).sum()
}
