//! Binance spot REST client with rate limiting.
//!
//! Provides typed access to the three public market data endpoints the
//! sampler needs, with a per-request timeout and a `governor` rate limiter
//! sized to the exchange's request weight budget.
//!
//! # Example
//!
//! ```ignore
//! use spread_watch_binance::{BinanceClient, BinanceClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BinanceClient::new(BinanceClientConfig::default())?;
//!     let book = client.get_book_ticker("BTCUSDT").await?;
//!     println!("BTCUSDT spread: {}", book.spread());
//!     Ok(())
//! }
//! ```

use crate::models::{
    RawApiError, RawBookTicker, RawDepth, RawTicker24h, INVALID_SYMBOL_CODE,
};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use spread_watch_core::{
    DepthSnapshot, ExchangeConfig, Instrument, MarketDataError, MarketDataSource, Result,
    TickerSnapshot, TopOfBook, BINANCE_API_URL,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Depth limits the `/api/v3/depth` endpoint accepts.
pub const DEPTH_LIMITS: [usize; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];

/// Longest symbol we send to the exchange.
const MAX_SYMBOL_LEN: usize = 20;

/// Seconds to back off when a 429/418 carries no `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Binance client.
#[derive(Debug, Clone)]
pub struct BinanceClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BinanceClientConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_URL.to_string(),
            requests_per_minute: nonzero!(1200u32),
            timeout_secs: 10,
        }
    }
}

impl From<&ExchangeConfig> for BinanceClientConfig {
    fn from(config: &ExchangeConfig) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config.base_url.clone(),
            requests_per_minute: NonZeroU32::new(config.requests_per_minute)
                .unwrap_or(defaults.requests_per_minute),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl BinanceClientConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Smallest depth limit the exchange accepts that covers `levels`.
///
/// Requests above the largest limit are capped at it.
#[must_use]
pub fn depth_limit_for(levels: usize) -> usize {
    DEPTH_LIMITS
        .iter()
        .copied()
        .find(|&limit| limit >= levels)
        .unwrap_or(DEPTH_LIMITS[DEPTH_LIMITS.len() - 1])
}

// =============================================================================
// BinanceClient
// =============================================================================

/// Binance spot REST API client.
pub struct BinanceClient {
    /// Configuration.
    config: BinanceClientConfig,

    /// HTTP client.
    http: Client,

    /// Rate limiter.
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.config.base_url)
            .field("requests_per_minute", &self.config.requests_per_minute)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl BinanceClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: BinanceClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                MarketDataError::SourceUnavailable(format!("failed to build HTTP client: {e}"))
            })?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    /// Validates a symbol before it is placed in a query string.
    ///
    /// Binance symbols are short ASCII alphanumeric strings such as "BTCUSDT".
    fn validate_symbol(symbol: &str) -> Result<&str> {
        if symbol.is_empty()
            || symbol.len() > MAX_SYMBOL_LEN
            || !symbol.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(MarketDataError::unknown_instrument(symbol));
        }
        Ok(symbol)
    }

    /// Waits for the rate limiter and makes a GET request.
    ///
    /// `symbol` is the instrument the request concerns, used to report an
    /// unknown-symbol rejection.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        symbol: Option<&str>,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        self.handle_response(response, symbol).await
    }

    /// Handles API response, converting errors appropriately.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        symbol: Option<&str>,
    ) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 || status.as_u16() == 418 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(MarketDataError::rate_limited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<RawApiError>(&text) {
                if api_error.code == INVALID_SYMBOL_CODE {
                    return Err(MarketDataError::unknown_instrument(
                        symbol.unwrap_or_default(),
                    ));
                }
                return Err(MarketDataError::api(
                    status.as_u16(),
                    format!("{} ({})", api_error.msg, api_error.code),
                ));
            }
            return Err(MarketDataError::api(status.as_u16(), text));
        }

        let body = serde_json::from_str::<T>(&text)?;
        Ok(body)
    }

    // =========================================================================
    // Market Data Endpoints
    // =========================================================================

    /// Gets 24-hour rolling statistics for every listed symbol.
    ///
    /// # Errors
    /// Returns error if the API call fails or the payload is not a ticker array.
    pub async fn get_ticker_24h(&self) -> Result<Vec<TickerSnapshot>> {
        let rows: Vec<RawTicker24h> = self.get("/api/v3/ticker/24hr", None).await?;
        Ok(rows.into_iter().map(TickerSnapshot::from).collect())
    }

    /// Gets the order book for `symbol` with at least `levels` levels per side
    /// (the exchange may return more, see [`depth_limit_for`]).
    ///
    /// # Errors
    /// Returns error if the symbol is unknown, the API call fails, or a level
    /// does not parse.
    pub async fn get_depth(&self, symbol: &str, levels: usize) -> Result<DepthSnapshot> {
        let symbol = Self::validate_symbol(symbol)?;
        let limit = depth_limit_for(levels);
        let path = format!("/api/v3/depth?symbol={symbol}&limit={limit}");

        let raw: RawDepth = self.get(&path, Some(symbol)).await?;
        raw.into_snapshot(symbol)
    }

    /// Gets the current best bid and ask for `symbol`.
    ///
    /// # Errors
    /// Returns error if the symbol is unknown, the API call fails, or a price
    /// does not parse.
    pub async fn get_book_ticker(&self, symbol: &str) -> Result<TopOfBook> {
        let symbol = Self::validate_symbol(symbol)?;
        let path = format!("/api/v3/ticker/bookTicker?symbol={symbol}");

        let raw: RawBookTicker = self.get(&path, Some(symbol)).await?;
        TopOfBook::try_from(raw)
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn fetch_ticker_24h(&self) -> Result<Vec<TickerSnapshot>> {
        self.get_ticker_24h().await
    }

    async fn fetch_depth(&self, instrument: &Instrument, levels: usize) -> Result<DepthSnapshot> {
        self.get_depth(&instrument.symbol, levels).await
    }

    async fn fetch_best_bid_ask(&self, instrument: &Instrument) -> Result<TopOfBook> {
        self.get_book_ticker(&instrument.symbol).await
    }
}
