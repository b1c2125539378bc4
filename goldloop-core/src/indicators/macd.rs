//! MACD — line = EMA(12) - EMA(26); signal = EMA(9) of the line; hist = line - signal.

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::ema::ema_of_series;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdComponent {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal_period: usize,
    component: MacdComponent,
    name: String,
}

impl Macd {
    pub fn line(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self { fast, slow, signal_period, component: MacdComponent::Line, name: "macd_line".into() }
    }
    pub fn signal(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self {
            fast,
            slow,
            signal_period,
            component: MacdComponent::Signal,
            name: "macd_signal".into(),
        }
    }
    pub fn histogram(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self {
            fast,
            slow,
            signal_period,
            component: MacdComponent::Histogram,
            name: "macd_hist".into(),
        }
    }

    fn compute_all(&self, bars: &[Bar]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let ema_fast = ema_of_series(&closes, self.fast);
        let ema_slow = ema_of_series(&closes, self.slow);
        let n = bars.len();
        let mut line = vec![f64::NAN; n];
        for i in 0..n {
            if !ema_fast[i].is_nan() && !ema_slow[i].is_nan() {
                line[i] = ema_fast[i] - ema_slow[i];
            }
        }
        let signal = ema_of_series(&line, self.signal_period);
        let mut hist = vec![f64::NAN; n];
        for i in 0..n {
            if !line[i].is_nan() && !signal[i].is_nan() {
                hist[i] = line[i] - signal[i];
            }
        }
        (line, signal, hist)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (line, signal, hist) = self.compute_all(bars);
        match self.component {
            MacdComponent::Line => line,
            MacdComponent::Signal => signal,
            MacdComponent::Histogram => hist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let bars = make_bars(&closes);
        let line = Macd::line(12, 26, 9).compute(&bars);
        let signal = Macd::signal(12, 26, 9).compute(&bars);
        let hist = Macd::histogram(12, 26, 9).compute(&bars);
        for i in 0..bars.len() {
            if !line[i].is_nan() && !signal[i].is_nan() {
                assert!((hist[i] - (line[i] - signal[i])).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn macd_uptrend_has_positive_line_late() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 1.0).collect();
        let bars = make_bars(&closes);
        let line = Macd::line(12, 26, 9).compute(&bars);
        assert!(line[59] > 0.0);
    }

    #[test]
    fn no_lookahead_contamination() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let bars = make_bars(&closes);
        let line = Macd::line(12, 26, 9);
        let full = line.compute(&bars);
        let truncated = line.compute(&bars[..40]);
        for i in 0..40 {
            if full[i].is_nan() {
                assert!(truncated[i].is_nan());
            } else {
                assert_approx(full[i], truncated[i], DEFAULT_EPSILON);
            }
        }
    }
}
