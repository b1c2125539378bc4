//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[0] = close[0]; EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1].
//! Defined at every index — there is no warm-up lookback for a bare EMA.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self { period, name: format!("ema_{period}") }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// Compute raw EMA values from a pre-extracted f64 slice, seeded with the
/// first value and emitting at every index (matches `ewm(adjust=False)`).
/// Used internally by composed indicators (MACD, ADX) that need EMA of an
/// arbitrary series. A `NaN` anywhere in `values` poisons every index from
/// there onward, since the recursion has no way to skip past it.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n == 0 || period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    if values[0].is_nan() {
        return result;
    }
    result[0] = values[0];
    let mut prev = values[0];

    for i in 1..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let ema = Ema::new(1);
        let result = ema.compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_seeded_with_first_close_and_defined_from_index_zero() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let ema = Ema::new(3);
        let result = ema.compute(&bars);
        // alpha = 2/(3+1) = 0.5
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0625, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_in_seed_produces_all_nan() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        bars[0].close = f64::NAN;
        let ema = Ema::new(3);
        let result = ema.compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_nan_mid_series_poisons_from_that_index_onward() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        bars[2].close = f64::NAN;
        let ema = Ema::new(3);
        let result = ema.compute(&bars);
        assert!(!result[0].is_nan());
        assert!(!result[1].is_nan());
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
    }

    #[test]
    fn ema_lookback_is_zero() {
        assert_eq!(Ema::new(20).lookback(), 0);
    }

    #[test]
    fn no_lookahead_contamination() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let ema = Ema::new(3);
        let full = ema.compute(&bars);
        let truncated = ema.compute(&bars[..5]);
        for i in 0..5 {
            if full[i].is_nan() {
                assert!(truncated[i].is_nan());
            } else {
                assert_approx(full[i], truncated[i], DEFAULT_EPSILON);
            }
        }
    }
}
