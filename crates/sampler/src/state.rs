//! Retained samples and the deltas computed against them.

use spread_watch_core::TopOfBook;
use std::collections::BTreeMap;

/// Most recent top-of-book per symbol.
///
/// Entries are only ever inserted or overwritten; a symbol whose fetch failed
/// keeps its previous sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleState {
    samples: BTreeMap<String, TopOfBook>,
}

impl SampleState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&TopOfBook> {
        self.samples.get(symbol)
    }

    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.samples.contains_key(symbol)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    /// Absolute spread change for every snapshot whose symbol has a retained
    /// sample. Symbols seen for the first time produce nothing.
    #[must_use]
    pub fn diff(&self, snapshots: &[TopOfBook]) -> SpreadDelta {
        let deltas = snapshots
            .iter()
            .filter_map(|current| {
                self.samples.get(&current.symbol).map(|previous| {
                    (
                        current.symbol.clone(),
                        (current.spread() - previous.spread()).abs(),
                    )
                })
            })
            .collect();
        SpreadDelta(deltas)
    }

    /// Replaces the retained sample of each snapshot's symbol.
    pub fn update(&mut self, snapshots: impl IntoIterator<Item = TopOfBook>) {
        for snapshot in snapshots {
            self.samples.insert(snapshot.symbol.clone(), snapshot);
        }
    }
}

/// Symbol to non-negative spread change for one iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadDelta(BTreeMap<String, f64>);

impl SpreadDelta {
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.0.get(symbol).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(symbol, delta)| (symbol.as_str(), *delta))
    }

    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

impl FromIterator<(String, f64)> for SpreadDelta {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
