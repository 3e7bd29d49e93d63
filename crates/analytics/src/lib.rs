//! One-shot market data transforms: ranking instruments by 24h activity and
//! summing order book notional.

pub mod notional;
pub mod selector;

pub use notional::{side_notional, NotionalAggregator};
pub use selector::{rank_tickers, SymbolSelector};
