//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol on a single day.
///
/// Uniqueness: `(symbol, date)`. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Basic OHLCV sanity check: high >= low, high >= open/close, etc.
    pub fn is_sane(&self) -> bool {
        if self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Close-to-close percent change relative to `prev`.
    pub fn pct_change_from(&self, prev: &Bar) -> f64 {
        if prev.close == 0.0 {
            return 0.0;
        }
        (self.close - prev.close) / prev.close * 100.0
    }
}
