//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period, name: format!("sma_{period}") }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        sma_of_series(&closes, self.period)
    }
}

/// Rolling mean of an arbitrary f64 series. Shared by Bollinger and the
/// regime classifier's ATR/volume ratio baselines.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period || period == 0 {
        return result;
    }
    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }
    result
}

/// Sample standard deviation (ddof=1, i.e. divides by n-1).
pub fn sample_stdev(window: &[f64], mean: f64) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let variance: f64 =
        window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let sma = Sma::new(5);
        let result = sma.compute(&bars);
        for i in 0..4 {
            assert!(result[i].is_nan());
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let sma = Sma::new(5);
        let result = sma.compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sample_stdev_of_constant_series_is_zero() {
        assert_eq!(sample_stdev(&[5.0, 5.0, 5.0], 5.0), 0.0);
    }

    #[test]
    fn no_lookahead_contamination() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let sma = Sma::new(5);
        let full = sma.compute(&bars);
        let truncated = sma.compute(&bars[..5]);
        for i in 0..5 {
            if full[i].is_nan() {
                assert!(truncated[i].is_nan());
            } else {
                assert_approx(full[i], truncated[i], DEFAULT_EPSILON);
            }
        }
    }
}
