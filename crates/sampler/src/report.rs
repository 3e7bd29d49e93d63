use crate::state::SpreadDelta;
use std::collections::BTreeMap;
use std::fmt;

/// A best bid/ask fetch that failed during collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub symbol: String,
    pub error: String,
}

/// Outcome of one sampling iteration, sent to the report channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IterationReport {
    /// 1-based iteration number.
    pub iteration: u64,
    /// Spread of every instrument collected this iteration.
    pub spreads: BTreeMap<String, f64>,
    pub deltas: SpreadDelta,
    pub failures: Vec<FetchFailure>,
}

impl fmt::Display for IterationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} deltas {{", self.iteration)?;
        for (i, (symbol, delta)) in self.deltas.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{symbol}: {delta}")?;
        }
        f.write_str("}")?;
        if !self.failures.is_empty() {
            let failed: Vec<&str> = self.failures.iter().map(|x| x.symbol.as_str()).collect();
            write!(f, " failed [{}]", failed.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_deltas_and_failures() {
        let report = IterationReport {
            iteration: 3,
            spreads: BTreeMap::new(),
            deltas: vec![("BTCUSDT".to_string(), 0.5), ("ETHUSDT".to_string(), 0.0)]
                .into_iter()
                .collect(),
            failures: vec![FetchFailure {
                symbol: "XRPUSDT".to_string(),
                error: "source unavailable: timeout".to_string(),
            }],
        };

        assert_eq!(
            report.to_string(),
            "#3 deltas {BTCUSDT: 0.5, ETHUSDT: 0} failed [XRPUSDT]"
        );
    }

    #[test]
    fn test_display_without_deltas_or_failures() {
        let report = IterationReport {
            iteration: 1,
            ..IterationReport::default()
        };
        assert_eq!(report.to_string(), "#1 deltas {}");
    }
}
