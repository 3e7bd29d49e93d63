//! CLI commands for the spread sampler.

pub mod common;
pub mod notional;
pub mod run;
pub mod spreads;
pub mod top_symbols;

pub use common::UniverseArgs;
pub use notional::{run_notional, NotionalArgs};
pub use run::{run_pipeline, RunArgs};
pub use spreads::run_spreads;
pub use top_symbols::run_top_symbols;
