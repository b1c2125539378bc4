//! Relative Strength Index (RSI).
//!
//! Uses a simple moving mean of gains and losses over the period — NOT
//! Wilder's recursive smoothing. Lookback: period.
//! Edge cases: avg_loss == 0 and avg_gain > 0 -> 100; avg_gain == 0 and
//! avg_loss > 0 -> 0; both zero (flat market) -> 50.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period, name: format!("rsi_{period}") }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let curr = bars[i].close;
            let prev = bars[i - 1].close;
            if curr.is_nan() || prev.is_nan() {
                continue;
            }
            let change = curr - prev;
            gains[i] = if change > 0.0 { change } else { 0.0 };
            losses[i] = if change < 0.0 { -change } else { 0.0 };
        }

        for i in self.period..n {
            let window_gains = &gains[(i + 1 - self.period)..=i];
            let window_losses = &losses[(i + 1 - self.period)..=i];
            if window_gains.iter().any(|v| v.is_nan()) || window_losses.iter().any(|v| v.is_nan())
            {
                continue;
            }
            let avg_gain = window_gains.iter().sum::<f64>() / self.period as f64;
            let avg_loss = window_losses.iter().sum::<f64>() / self.period as f64;
            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
