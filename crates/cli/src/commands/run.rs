//! Full pipeline: selection, one-shot reports, then the sampling loop with
//! the metrics endpoint serving alongside until Ctrl+C.

use super::common::{
    build_client, collect_spreads, instruments_of, load_config, print_notional, print_spreads,
    print_top_symbols, select_with_retry,
};
use anyhow::{Context, Result};
use clap::Args;
use spread_watch_analytics::{NotionalAggregator, SymbolSelector};
use spread_watch_core::AppConfig;
use spread_watch_metrics_api::{MetricsRegistry, MetricsServer};
use spread_watch_sampler::{IterationReport, SpreadSampler};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Arguments for the run command.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Port of the metrics endpoint (overrides metrics.port)
    #[arg(long, env = "SPREAD_WATCH_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Seconds between sampling iterations (overrides sampler.interval_secs)
    #[arg(long, env = "SPREAD_WATCH_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,
}

impl RunArgs {
    /// Applies the flags that were given to `config` and re-validates it.
    pub fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
        if let Some(secs) = self.interval_secs {
            config.sampler.interval_secs = secs;
        }
        config.validate()
    }
}

/// Runs the spread sampler daemon.
///
/// # Errors
/// Returns an error if the metrics endpoint cannot be bound, or if selection
/// or a one-shot report fails before the loop starts.
pub async fn run_pipeline(config_path: &str, args: RunArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    args.apply(&mut config)?;

    let registry = Arc::new(MetricsRegistry::new());
    let endpoint =
        MetricsEndpoint::start(&config.metrics.bind_addr(), Arc::clone(&registry)).await?;
    info!(addr = %endpoint.addr, "Metrics endpoint serving during selection");

    let client = build_client(&config.exchange)?;
    let selector = SymbolSelector::new(Arc::clone(&client));
    let max_attempts = config.selection.max_attempts;

    let notional_ranked =
        select_with_retry(&selector, &config.notional_universe, max_attempts).await?;
    let spread_ranked = select_with_retry(&selector, &config.spread_universe, max_attempts).await?;
    print_top_symbols(&config.notional_universe, &notional_ranked);
    print_top_symbols(&config.spread_universe, &spread_ranked);

    let top_levels = config.notional.top_levels;
    let totals = NotionalAggregator::new(Arc::clone(&client))
        .total_notional_for(&instruments_of(&notional_ranked), top_levels)
        .await
        .context("failed to aggregate order book notional")?;
    print_notional(top_levels, &totals);

    let instruments = instruments_of(&spread_ranked);
    let books = collect_spreads(client.as_ref(), &instruments).await?;
    print_spreads(&books);

    // Console reports
    let (report_tx, report_rx) = mpsc::channel(config.sampler.report_channel_capacity);
    let printer_handle = tokio::spawn(print_reports(report_rx));

    let mut sampler = SpreadSampler::new(client, registry, instruments, config.sampler.clone())
        .with_report_channel(report_tx);

    tokio::select! {
        () = sampler.run_forever() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, shutting down");
        }
    }

    let iterations = sampler.iteration();
    drop(sampler);
    endpoint.stop().await;
    let _ = printer_handle.await;

    info!(iterations, "Spread sampler stopped");
    Ok(())
}

/// Metrics endpoint serving in the background from the moment it is bound,
/// so `/health` answers `STARTING` while selection is still running.
struct MetricsEndpoint {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl MetricsEndpoint {
    async fn start(addr: &str, registry: Arc<MetricsRegistry>) -> Result<Self> {
        let server = MetricsServer::bind(addr, registry).await?;
        let addr = server.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(async move {
            let _ = shutdown_rx.await;
        }));
        Ok(Self {
            addr,
            shutdown_tx,
            handle,
        })
    }

    async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        match self.handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Metrics endpoint error: {}", e),
            Err(e) => error!("Metrics endpoint task failed: {}", e),
        }
    }
}

async fn print_reports(mut rx: mpsc::Receiver<IterationReport>) {
    while let Some(report) = rx.recv().await {
        println!("{report}");
        for failure in &report.failures {
            println!("  {} failed: {}", failure.symbol, failure.error);
        }
    }
}
