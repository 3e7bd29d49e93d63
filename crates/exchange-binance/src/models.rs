//! Wire shapes of the Binance spot REST responses and their conversion into
//! core types.

use serde::Deserialize;
use spread_watch_core::{DepthSnapshot, MarketDataError, PriceLevel, Result, TickerSnapshot, TopOfBook};

/// Numeric field that Binance sends either as a JSON string or a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawNumber {
    Text(String),
    Number(serde_json::Number),
}

impl RawNumber {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn text_of(value: Option<RawNumber>) -> String {
    value.map(RawNumber::into_text).unwrap_or_default()
}

/// Row of `GET /api/v3/ticker/24hr`. Only the fields we rank by are kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTicker24h {
    pub symbol: String,
    #[serde(default)]
    pub volume: Option<RawNumber>,
    #[serde(default)]
    pub quote_volume: Option<RawNumber>,
    #[serde(default)]
    pub count: Option<RawNumber>,
}

impl From<RawTicker24h> for TickerSnapshot {
    fn from(raw: RawTicker24h) -> Self {
        Self {
            symbol: raw.symbol,
            volume: text_of(raw.volume),
            quote_volume: text_of(raw.quote_volume),
            trade_count: text_of(raw.count),
        }
    }
}

/// Body of `GET /api/v3/depth`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDepth {
    #[allow(dead_code)]
    pub last_update_id: Option<u64>,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

impl RawDepth {
    pub fn into_snapshot(self, symbol: &str) -> Result<DepthSnapshot> {
        Ok(DepthSnapshot {
            symbol: symbol.to_string(),
            bids: parse_levels(&self.bids)?,
            asks: parse_levels(&self.asks)?,
        })
    }
}

/// Body of `GET /api/v3/ticker/bookTicker?symbol=...`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawBookTicker {
    pub symbol: String,
    pub bid_price: String,
    pub ask_price: String,
}

impl TryFrom<RawBookTicker> for TopOfBook {
    type Error = MarketDataError;

    fn try_from(raw: RawBookTicker) -> Result<Self> {
        let bid_price = parse_decimal(&raw.bid_price, "bidPrice")?;
        let ask_price = parse_decimal(&raw.ask_price, "askPrice")?;
        Ok(Self::new(raw.symbol, bid_price, ask_price))
    }
}

/// Error body Binance returns alongside 4xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawApiError {
    pub code: i64,
    pub msg: String,
}

/// Binance error code for a symbol the exchange does not list.
pub(crate) const INVALID_SYMBOL_CODE: i64 = -1121;

/// Parses `[price, quantity]` string pairs.
pub(crate) fn parse_levels(levels: &[[String; 2]]) -> Result<Vec<PriceLevel>> {
    levels
        .iter()
        .map(|[price, qty]| {
            Ok(PriceLevel::new(
                parse_decimal(price, "price")?,
                parse_decimal(qty, "quantity")?,
            ))
        })
        .collect()
}

/// Parses a decimal string into a finite `f64`.
pub(crate) fn parse_decimal(value: &str, field: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(MarketDataError::malformed(format!(
            "{field} is not a finite number: {value:?}"
        ))),
    }
}
