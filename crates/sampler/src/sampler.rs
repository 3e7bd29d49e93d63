//! The snapshot-diff sampling loop.
//!
//! Each iteration collects the best bid/ask of every instrument, diffs the
//! spreads against the samples retained from the previous iteration, publishes
//! the deltas and then retains the new samples.

use crate::report::{FetchFailure, IterationReport};
use crate::state::SampleState;
use futures::future::join_all;
use spread_watch_core::{
    Instrument, MarketDataSource, MetricsPublisher, SamplerConfig, SamplingMode, TopOfBook,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// Snapshots and failures from one collection pass.
#[derive(Debug, Default)]
struct Collection {
    snapshots: Vec<TopOfBook>,
    failures: Vec<FetchFailure>,
}

/// Periodically samples spreads and publishes their change.
pub struct SpreadSampler<S: ?Sized, P: ?Sized> {
    source: Arc<S>,
    publisher: Arc<P>,
    /// Instruments to sample, fixed for the sampler's lifetime.
    instruments: Vec<Instrument>,
    config: SamplerConfig,
    state: SampleState,
    iteration: u64,
    /// Optional report channel for the console.
    report_tx: Option<mpsc::Sender<IterationReport>>,
}

impl<S, P> SpreadSampler<S, P>
where
    S: MarketDataSource + ?Sized,
    P: MetricsPublisher + ?Sized,
{
    /// Creates a sampler with an empty sample state.
    pub fn new(
        source: Arc<S>,
        publisher: Arc<P>,
        instruments: Vec<Instrument>,
        config: SamplerConfig,
    ) -> Self {
        Self {
            source,
            publisher,
            instruments,
            config,
            state: SampleState::new(),
            iteration: 0,
            report_tx: None,
        }
    }

    /// Sets the channel iteration reports are sent to.
    ///
    /// Reports are dropped when the channel is full; the loop never waits on it.
    #[must_use]
    pub fn with_report_channel(mut self, tx: mpsc::Sender<IterationReport>) -> Self {
        self.report_tx = Some(tx);
        self
    }

    pub fn state(&self) -> &SampleState {
        &self.state
    }

    /// Number of completed iterations.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Runs iterations until the returned future is dropped.
    ///
    /// In retained mode the loop sleeps the configured interval after each
    /// iteration. In paired mode the interval is spent inside the iteration,
    /// between its two collections.
    pub async fn run_forever(&mut self) {
        info!(
            instruments = self.instruments.len(),
            interval_secs = self.config.interval_secs,
            mode = ?self.config.mode,
            parallel_fetch = self.config.parallel_fetch,
            "Spread sampler started"
        );

        loop {
            self.run_iteration().await;

            if self.config.mode == SamplingMode::Retained {
                tokio::time::sleep(self.config.interval()).await;
            }
        }
    }

    /// Runs one collect / diff / publish / report / update cycle.
    ///
    /// Fetch failures are isolated per instrument: they are logged, counted and
    /// reported, and the failed instrument keeps its previous sample. In paired
    /// mode an instrument whose baseline fetch failed yields no delta.
    pub async fn run_iteration(&mut self) -> IterationReport {
        let mut failures = Vec::new();
        if self.config.mode == SamplingMode::Paired {
            let baseline = self.collect().await;
            self.state.update(baseline.snapshots);
            failures = baseline.failures;
            tokio::time::sleep(self.config.interval()).await;
        }

        let collection = self.collect().await;

        let spreads: BTreeMap<String, f64> = collection
            .snapshots
            .iter()
            .map(|tob| (tob.symbol.clone(), tob.spread()))
            .collect();

        // An instrument whose baseline failed would diff against an older sample.
        let diffable: Vec<TopOfBook> = collection
            .snapshots
            .iter()
            .filter(|tob| !failures.iter().any(|f| f.symbol == tob.symbol))
            .cloned()
            .collect();
        let deltas = self.state.diff(&diffable);
        failures.extend(collection.failures);
        for (symbol, delta) in deltas.iter() {
            self.publisher.set_spread_delta(symbol, delta);
        }

        self.iteration += 1;
        let report = IterationReport {
            iteration: self.iteration,
            spreads,
            deltas,
            failures,
        };

        info!(
            iteration = report.iteration,
            collected = report.spreads.len(),
            failed = report.failures.len(),
            deltas = ?report.deltas.as_map(),
            "Sampling iteration complete"
        );
        self.send_report(&report);

        self.state.update(collection.snapshots);
        self.publisher.record_iteration();

        report
    }

    async fn collect(&self) -> Collection {
        let results = if self.config.parallel_fetch {
            join_all(
                self.instruments
                    .iter()
                    .map(|instrument| self.source.fetch_best_bid_ask(instrument)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(self.instruments.len());
            for instrument in &self.instruments {
                results.push(self.source.fetch_best_bid_ask(instrument).await);
            }
            results
        };

        let mut collection = Collection::default();
        for (instrument, result) in self.instruments.iter().zip(results) {
            match result {
                Ok(tob) => collection.snapshots.push(tob),
                Err(e) => {
                    warn!(symbol = %instrument.symbol, error = %e, "Failed to fetch best bid/ask");
                    self.publisher.record_fetch_error(&instrument.symbol);
                    collection.failures.push(FetchFailure {
                        symbol: instrument.symbol.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        collection
    }

    fn send_report(&mut self, report: &IterationReport) {
        let Some(tx) = &self.report_tx else {
            return;
        };

        match tx.try_send(report.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(iteration = report.iteration, "Report channel full, dropping report");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Report channel closed, no longer sending reports");
                self.report_tx = None;
            }
        }
    }
}
