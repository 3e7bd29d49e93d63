use crate::error::Result;
use crate::types::{DepthSnapshot, Instrument, TickerSnapshot, TopOfBook};
use async_trait::async_trait;

/// Read-only access to an exchange's public market data.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// All instruments' 24-hour statistics in one call.
    async fn fetch_ticker_24h(&self) -> Result<Vec<TickerSnapshot>>;

    /// At least `levels` order book levels per side for one instrument.
    async fn fetch_depth(&self, instrument: &Instrument, levels: usize) -> Result<DepthSnapshot>;

    /// Current best bid and ask for one instrument.
    async fn fetch_best_bid_ask(&self, instrument: &Instrument) -> Result<TopOfBook>;
}

/// Sink for the values the sampler exports.
///
/// Each call is independent; implementations must make a single gauge update
/// atomic with respect to concurrent readers.
pub trait MetricsPublisher: Send + Sync {
    /// Sets the spread delta gauge labelled with `symbol`, creating it on first use.
    fn set_spread_delta(&self, symbol: &str, value: f64);

    /// Counts a failed fetch for `symbol`.
    fn record_fetch_error(&self, _symbol: &str) {}

    /// Counts a completed sampling iteration.
    fn record_iteration(&self) {}
}
