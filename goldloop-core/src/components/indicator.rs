//! Indicator trait and precomputed indicator values container.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are precomputed once before the bar loop and fed per-bar into
//! the event loop. No recomputation on each bar.

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN`
/// (warmup); an indicator with no fixed warm-up window (e.g. a recursive
/// EMA, seeded at the first bar) reports a `lookback()` of zero.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    /// The first `lookback()` values should be `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator values.
///
/// Built once before the bar loop, then queried by bar index during the loop.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
