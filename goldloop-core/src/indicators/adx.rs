//! ADX — Average Directional Index.
//!
//! +DM/-DM filtered so only the dominant positive direction per bar survives,
//! smoothed by EMA (this crate's standard EMA convention, not Wilder
//! smoothing). +DI/-DI = 100*EMA(DM)/EMA(TR);
//! DX = 100*|+DI--DI|/(+DI+-DI); ADX = EMA(DX).

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::indicators::atr::true_range;
use crate::indicators::ema::ema_of_series;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period, name: format!("adx_{period}") }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (_plus_di, _minus_di, adx) = compute_adx_full(bars, self.period);
        adx
    }
}

/// Returns (+DI, -DI, ADX) series, all sharing the same smoothing period.
pub fn compute_adx_full(bars: &[Bar], period: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = bars.len();
    if n < 2 {
        return (vec![f64::NAN; n], vec![f64::NAN; n], vec![f64::NAN; n]);
    }

    // DM[0] has no previous bar to diff against; the original's
    // `.diff()` yields NaN there, and `.where(cond, 0)` replaces a
    // NaN-driven false condition with 0, not NaN.
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let high_diff = bars[i].high - bars[i - 1].high;
        let low_diff = bars[i - 1].low - bars[i].low;
        if bars[i].high.is_nan() || bars[i].low.is_nan() || bars[i - 1].high.is_nan()
            || bars[i - 1].low.is_nan()
        {
            continue;
        }
        plus_dm[i] = if high_diff > low_diff && high_diff > 0.0 { high_diff } else { 0.0 };
        minus_dm[i] = if low_diff > high_diff && low_diff > 0.0 { low_diff } else { 0.0 };
    }

    let tr = true_range(&bars[..n]);
    let smooth_tr = ema_of_series(&tr, period);
    let smooth_plus = ema_of_series(&plus_dm, period);
    let smooth_minus = ema_of_series(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan() || smooth_plus[i].is_nan() || smooth_minus[i].is_nan()
            || smooth_tr[i] == 0.0
        {
            continue;
        }
        plus_di[i] = 100.0 * smooth_plus[i] / smooth_tr[i];
        minus_di[i] = 100.0 * smooth_minus[i] / smooth_tr[i];
        let sum = plus_di[i] + minus_di[i];
        dx[i] = if sum == 0.0 { 0.0 } else { 100.0 * (plus_di[i] - minus_di[i]).abs() / sum };
    }

    let adx = ema_of_series(&dx, period);
    (plus_di, minus_di, adx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn adx_bounds() {
        let mut data = Vec::new();
        for i in 0..30 {
            let base = 100.0 + (i as f64) * 2.0;
            data.push((base - 1.0, base + 3.0, base - 3.0, base + 2.0));
        }
        let bars = make_ohlc_bars(&data);
        let adx = Adx::new(5);
        let result = adx.compute(&bars);
        for &v in result.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn adx_too_few_bars_all_nan() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        let adx = Adx::new(3);
        let result = adx.compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn no_lookahead_contamination() {
        let mut data = Vec::new();
        for i in 0..30 {
            let base = 100.0 + (i as f64) * 2.0;
            data.push((base - 1.0, base + 3.0, base - 3.0, base + 2.0));
        }
        let bars = make_ohlc_bars(&data);
        let adx = Adx::new(5);
        let full = adx.compute(&bars);
        let truncated = adx.compute(&bars[..20]);
        for i in 0..20 {
            if full[i].is_nan() {
                assert!(truncated[i].is_nan());
            } else {
                assert_approx(full[i], truncated[i], DEFAULT_EPSILON);
            }
        }
    }
}
