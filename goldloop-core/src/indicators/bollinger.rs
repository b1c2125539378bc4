//! Bollinger Bands — SMA +/- a stdev multiplier.
//!
//! Three bands (separate Indicator instances). Uses sample stdev (ddof=1).
//! Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::sma::sample_stdev;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self { period, multiplier, band: BollingerBand::Upper, name: format!("bb_upper_{period}") }
    }
    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self {
            period,
            multiplier,
            band: BollingerBand::Middle,
            name: format!("bb_middle_{period}"),
        }
    }
    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self { period, multiplier, band: BollingerBand::Lower, name: format!("bb_lower_{period}") }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }
        for i in (self.period - 1)..n {
            let window: Vec<f64> = bars[(i + 1 - self.period)..=i].iter().map(|b| b.close).collect();
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            let mean = window.iter().sum::<f64>() / self.period as f64;
            result[i] = match self.band {
                BollingerBand::Middle => mean,
                BollingerBand::Upper => mean + self.multiplier * sample_stdev(&window, mean),
                BollingerBand::Lower => mean - self.multiplier * sample_stdev(&window, mean),
            };
        }
        result
    }
}
