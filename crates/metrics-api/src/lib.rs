//! Metrics registry and HTTP scrape endpoint.
//!
//! [`MetricsRegistry`] implements [`spread_watch_core::MetricsPublisher`] for
//! the sampler; [`MetricsServer`] exposes it as Prometheus text on `/metrics`.

pub mod handlers;
pub mod registry;
pub mod server;

pub use registry::{escape_label_value, Counter, CounterVec, Gauge, GaugeVec, MetricsRegistry};
pub use server::MetricsServer;
