pub mod config;
pub mod config_loader;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, ExchangeConfig, MetricsConfig, NotionalConfig, SamplerConfig, SamplingMode,
    SelectionConfig, UniverseConfig, BINANCE_API_URL,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use error::{MarketDataError, Result};
pub use traits::{MarketDataSource, MetricsPublisher};
pub use types::{
    DepthSnapshot, Instrument, NotionalTotals, PriceLevel, RankField, RankedInstrument,
    TickerSnapshot, TopOfBook,
};
