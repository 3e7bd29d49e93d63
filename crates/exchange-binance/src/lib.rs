//! Binance spot REST market data client.
//!
//! Wraps the three public endpoints the sampler consumes (24h ticker, order
//! book depth and best bid/ask) behind [`spread_watch_core::MarketDataSource`].

pub mod client;
mod models;

pub use client::{depth_limit_for, BinanceClient, BinanceClientConfig, DEPTH_LIMITS};
