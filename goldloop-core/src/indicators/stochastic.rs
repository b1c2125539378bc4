//! Stochastic oscillator: %K_raw then smoothed by SMA(smooth_k), %D = SMA(smooth_d) of %K.

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::sma::sma_of_series;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochLine {
    PercentK,
    PercentD,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    period: usize,
    smooth_k: usize,
    smooth_d: usize,
    line: StochLine,
    name: String,
}

impl Stochastic {
    pub fn percent_k(period: usize, smooth_k: usize, smooth_d: usize) -> Self {
        Self { period, smooth_k, smooth_d, line: StochLine::PercentK, name: "stoch_k".into() }
    }
    pub fn percent_d(period: usize, smooth_k: usize, smooth_d: usize) -> Self {
        Self { period, smooth_k, smooth_d, line: StochLine::PercentD, name: "stoch_d".into() }
    }

    fn raw_k(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut raw = vec![f64::NAN; n];
        if n < self.period {
            return raw;
        }
        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            if window.iter().any(|b| b.high.is_nan() || b.low.is_nan() || b.close.is_nan()) {
                continue;
            }
            let hi = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lo = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            let denom = hi - lo;
            raw[i] = if denom == 0.0 { f64::NAN } else { 100.0 * (bars[i].close - lo) / denom };
        }
        raw
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + self.smooth_k + self.smooth_d - 2
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let raw = self.raw_k(bars);
        let k = sma_of_series(&raw, self.smooth_k);
        match self.line {
            StochLine::PercentK => k,
            StochLine::PercentD => sma_of_series(&k, self.smooth_d),
        }
    }
}
