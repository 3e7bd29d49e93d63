use crate::types::RankField;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Binance spot REST base URL.
pub const BINANCE_API_URL: &str = "https://api.binance.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub metrics: MetricsConfig,
    /// Universe whose order book notional is reported once at startup.
    pub notional_universe: UniverseConfig,
    /// Universe whose spread is sampled continuously.
    pub spread_universe: UniverseConfig,
    pub notional: NotionalConfig,
    pub sampler: SamplerConfig,
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Per-request timeout. Bounds how long one stalled fetch can hold an iteration.
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub host: String,
    pub port: u16,
}

impl MetricsConfig {
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Quote asset suffix, matched case-sensitively against symbols.
    pub asset: String,
    pub rank_by: RankField,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionalConfig {
    pub top_levels: usize,
}

/// How the sampler spaces the two snapshots it diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// One fetch per iteration, diffed against the snapshot retained from the previous one.
    #[default]
    Retained,
    /// Fresh baseline, wait one interval, fetch again and diff the pair.
    Paired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub interval_secs: u64,
    pub mode: SamplingMode,
    pub parallel_fetch: bool,
    pub report_channel_capacity: usize,
}

impl SamplerConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Attempts made at startup before a failing selection aborts the process.
    pub max_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exchange: ExchangeConfig {
                base_url: BINANCE_API_URL.to_string(),
                timeout_secs: 10,
                requests_per_minute: 1200,
            },
            metrics: MetricsConfig {
                host: "0.0.0.0".to_string(),
                port: 8081,
            },
            notional_universe: UniverseConfig {
                asset: "BTC".to_string(),
                rank_by: RankField::Volume,
                count: 5,
            },
            spread_universe: UniverseConfig {
                asset: "USDT".to_string(),
                rank_by: RankField::TradeCount,
                count: 5,
            },
            notional: NotionalConfig { top_levels: 200 },
            sampler: SamplerConfig {
                interval_secs: 10,
                mode: SamplingMode::Retained,
                parallel_fetch: true,
                report_channel_capacity: 32,
            },
            selection: SelectionConfig { max_attempts: 3 },
        }
    }
}

impl AppConfig {
    /// Rejects values that would make a run meaningless or spin.
    ///
    /// # Errors
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.exchange.base_url.trim().is_empty() {
            bail!("exchange.base_url must not be empty");
        }
        if self.exchange.timeout_secs == 0 {
            bail!("exchange.timeout_secs must be greater than zero");
        }
        if self.exchange.requests_per_minute == 0 {
            bail!("exchange.requests_per_minute must be greater than zero");
        }
        for (name, universe) in [
            ("notional_universe", &self.notional_universe),
            ("spread_universe", &self.spread_universe),
        ] {
            if universe.asset.is_empty() {
                bail!("{name}.asset must not be empty");
            }
            if universe.count == 0 {
                bail!("{name}.count must be greater than zero");
            }
        }
        if self.notional.top_levels == 0 {
            bail!("notional.top_levels must be greater than zero");
        }
        if self.sampler.interval_secs == 0 {
            bail!("sampler.interval_secs must be greater than zero");
        }
        if self.sampler.report_channel_capacity == 0 {
            bail!("sampler.report_channel_capacity must be greater than zero");
        }
        if self.selection.max_attempts == 0 {
            bail!("selection.max_attempts must be greater than zero");
        }
        Ok(())
    }
}
