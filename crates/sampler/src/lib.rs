//! Snapshot-diff spread sampler.
//!
//! [`SpreadSampler`] repeatedly fetches each instrument's best bid/ask, keeps
//! the previous sample in a [`SampleState`], and publishes the absolute change
//! in spread through a [`spread_watch_core::MetricsPublisher`].

pub mod report;
pub mod sampler;
pub mod state;

pub use report::{FetchFailure, IterationReport};
pub use sampler::SpreadSampler;
pub use state::{SampleState, SpreadDelta};
