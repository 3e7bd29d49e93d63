//! Labeled gauge and counter registry rendered as Prometheus text exposition.
//!
//! No external metrics crate: every series value is a single atomic word, so a
//! scrape racing a write sees either the old or the new value, never a mix.

use parking_lot::RwLock;
use spread_watch_core::MetricsPublisher;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Name of the per-symbol spread delta gauge.
pub const SPREAD_DELTA_METRIC: &str = "price_spread_delta";
const SPREAD_DELTA_HELP: &str = "Price spread delta value of the symbols";

const FETCH_ERRORS_METRIC: &str = "spread_watch_fetch_errors_total";
const FETCH_ERRORS_HELP: &str = "Failed best bid/ask fetches per symbol";

const ITERATIONS_METRIC: &str = "spread_watch_iterations_total";
const ITERATIONS_HELP: &str = "Completed sampling iterations";

const UPTIME_METRIC: &str = "spread_watch_uptime_seconds";
const UPTIME_HELP: &str = "Seconds since the registry was created";

// ---------------------------------------------------------------------------
// Series values
// ---------------------------------------------------------------------------

/// An `f64` gauge stored as its bit pattern in one atomic word.
#[derive(Debug, Default)]
pub struct Gauge {
    bits: AtomicU64,
}

impl Gauge {
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// A metric family with one label. Series are created on first use and
/// never removed.
#[derive(Debug)]
pub struct MetricVec<T> {
    name: &'static str,
    help: &'static str,
    label: &'static str,
    series: RwLock<BTreeMap<String, Arc<T>>>,
}

/// Labeled gauge family.
pub type GaugeVec = MetricVec<Gauge>;

/// Labeled counter family.
pub type CounterVec = MetricVec<Counter>;

impl<T: Default> MetricVec<T> {
    #[must_use]
    pub fn new(name: &'static str, help: &'static str, label: &'static str) -> Self {
        Self {
            name,
            help,
            label,
            series: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the series for `label_value`, creating it if absent.
    ///
    /// The write lock is only taken when the series does not exist yet.
    pub fn with_label_value(&self, label_value: &str) -> Arc<T> {
        if let Some(series) = self.series.read().get(label_value) {
            return Arc::clone(series);
        }
        let mut series = self.series.write();
        Arc::clone(series.entry(label_value.to_string()).or_default())
    }

    /// Returns the series for `label_value` without creating it.
    #[must_use]
    pub fn get(&self, label_value: &str) -> Option<Arc<T>> {
        self.series.read().get(label_value).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }

    fn snapshot(&self) -> Vec<(String, Arc<T>)> {
        self.series
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Process-wide metrics shared between the sampler and the scrape endpoint.
#[derive(Debug)]
pub struct MetricsRegistry {
    spread_delta: GaugeVec,
    fetch_errors: CounterVec,
    iterations: Counter,
    start_time: Instant,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self {
            spread_delta: GaugeVec::new(SPREAD_DELTA_METRIC, SPREAD_DELTA_HELP, "symbol"),
            fetch_errors: CounterVec::new(FETCH_ERRORS_METRIC, FETCH_ERRORS_HELP, "symbol"),
            iterations: Counter::default(),
            start_time: Instant::now(),
        }
    }
}

impl MetricsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn spread_delta(&self) -> &GaugeVec {
        &self.spread_delta
    }

    #[must_use]
    pub fn fetch_errors(&self) -> &CounterVec {
        &self.fetch_errors
    }

    /// Number of completed sampling iterations.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations.get()
    }

    /// True once at least one sampling iteration has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.iterations() > 0
    }

    /// Render all metrics in Prometheus text exposition format (0.0.4).
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let mut out = String::with_capacity(1024);

        render_family(&mut out, &self.spread_delta, "gauge", |g| g.get().to_string());
        render_family(&mut out, &self.fetch_errors, "counter", |c| c.get().to_string());

        let _ = writeln!(out, "# HELP {ITERATIONS_METRIC} {ITERATIONS_HELP}");
        let _ = writeln!(out, "# TYPE {ITERATIONS_METRIC} counter");
        let _ = writeln!(out, "{ITERATIONS_METRIC} {}", self.iterations.get());

        let _ = writeln!(out, "# HELP {UPTIME_METRIC} {UPTIME_HELP}");
        let _ = writeln!(out, "# TYPE {UPTIME_METRIC} gauge");
        let _ = writeln!(out, "{UPTIME_METRIC} {}", self.start_time.elapsed().as_secs());

        out
    }
}

impl MetricsPublisher for MetricsRegistry {
    fn set_spread_delta(&self, symbol: &str, value: f64) {
        self.spread_delta.with_label_value(symbol).set(value);
    }

    fn record_fetch_error(&self, symbol: &str) {
        self.fetch_errors.with_label_value(symbol).inc();
    }

    fn record_iteration(&self) {
        self.iterations.inc();
    }
}

fn render_family<T: Default>(
    out: &mut String,
    family: &MetricVec<T>,
    kind: &str,
    value: impl Fn(&T) -> String,
) {
    let _ = writeln!(out, "# HELP {} {}", family.name, family.help);
    let _ = writeln!(out, "# TYPE {} {kind}", family.name);
    for (label_value, series) in family.snapshot() {
        let _ = writeln!(
            out,
            "{}{{{}=\"{}\"}} {}",
            family.name,
            family.label,
            escape_label_value(&label_value),
            value(&series)
        );
    }
}

/// Escapes backslash, double quote and newline in a label value.
#[must_use]
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}
