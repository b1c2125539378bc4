//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR = EMA of TR, seeded the same way as every other EMA in this crate
//! (EMA[0] = first value, defined at every index).

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::ema::ema_of_series;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period, name: format!("atr_{period}") }
    }
}

/// True Range series. TR[0] has no previous close to compare against, so
/// only the high-low term is defined there — matching the original's
/// row-wise max across the three candidate terms, which skips the two
/// `NaN` (no-previous-close) terms at index 0.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];
    if n == 0 {
        return tr;
    }
    if !bars[0].high.is_nan() && !bars[0].low.is_nan() {
        tr[0] = bars[0].high - bars[0].low;
    }
    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let tr = true_range(bars);
        ema_of_series(&tr, self.period)
    }
}
