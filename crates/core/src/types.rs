//! Domain types shared across the sampler, the selector and the exchange client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable symbol pair selected for a run, e.g. `BTCUSDT` quoted in `USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub quote_asset: String,
}

impl Instrument {
    #[must_use]
    pub fn new(symbol: impl Into<String>, quote_asset: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quote_asset: quote_asset.into(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Numeric field of the 24h ticker feed used to rank instruments.
///
/// Serialized names match the exchange's field names so configuration reads
/// the same way the feed does (`volume`, `quoteVolume`, `count`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankField {
    #[serde(rename = "volume")]
    Volume,
    #[serde(rename = "quoteVolume")]
    QuoteVolume,
    #[serde(rename = "count")]
    TradeCount,
}

impl RankField {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::QuoteVolume => "quoteVolume",
            Self::TradeCount => "count",
        }
    }
}

impl fmt::Display for RankField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RankField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volume" => Ok(Self::Volume),
            "quoteVolume" | "quote-volume" | "quote_volume" => Ok(Self::QuoteVolume),
            "count" | "trade-count" | "trade_count" | "tradeCount" => Ok(Self::TradeCount),
            other => Err(format!(
                "unknown rank field '{other}' (expected volume, quoteVolume or count)"
            )),
        }
    }
}

/// One row of the 24h ticker feed.
///
/// Rank values are kept in their textual form; they are parsed when a
/// ranking is requested so a bad value only fails the ranking that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub volume: String,
    pub quote_volume: String,
    pub trade_count: String,
}

impl TickerSnapshot {
    #[must_use]
    pub fn rank_value(&self, field: RankField) -> &str {
        match field {
            RankField::Volume => &self.volume,
            RankField::QuoteVolume => &self.quote_volume,
            RankField::TradeCount => &self.trade_count,
        }
    }
}

/// An instrument chosen by the selector, with the value it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedInstrument {
    pub instrument: Instrument,
    pub rank_field: RankField,
    pub rank_value: f64,
}

/// A single (price, quantity) order book level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

impl PriceLevel {
    #[must_use]
    pub const fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }

    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Order book depth for one instrument at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DepthSnapshot {
    pub symbol: String,
    /// Bids as returned by the source (best first).
    pub bids: Vec<PriceLevel>,
    /// Asks as returned by the source (best first).
    pub asks: Vec<PriceLevel>,
}

/// Best bid and ask of one instrument at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopOfBook {
    pub symbol: String,
    pub bid_price: f64,
    pub ask_price: f64,
}

impl TopOfBook {
    #[must_use]
    pub fn new(symbol: impl Into<String>, bid_price: f64, ask_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            bid_price,
            ask_price,
        }
    }

    /// Ask minus bid. Negative for a crossed book; never clamped.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }
}

/// Summed notional value of the top levels on each side of a book.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NotionalTotals {
    pub bids_notional: f64,
    pub asks_notional: f64,
}
