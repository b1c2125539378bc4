//! Regime classification — trend/volatility/liquidity labels from a bar
//! history plus its precomputed indicator series.

use crate::components::IndicatorValues;
use crate::domain::{Bar, Liquidity, Regime, RegimeSummary, Trend, Volatility};

const EMA_SLOPE_PERIOD: usize = 5;
const LOOKBACK_WINDOW: usize = 20;
const WARMUP_BARS: usize = 30;

/// Classify the regime at `index`, given the full bar history and its
/// precomputed `ema_9`, `ema_21`, `ema_50`, `adx_14`, `atr_14` series.
///
/// Returns `None` if any required series has not yet warmed up at `index`
/// (class-2 insufficient-warm-up condition — absence, not an error).
pub fn classify(bars: &[Bar], indicators: &IndicatorValues, index: usize) -> Option<Regime> {
    if index >= bars.len() || index < EMA_SLOPE_PERIOD {
        return None;
    }
    let price = bars[index].close;
    let ema9 = indicators.get("ema_9", index)?;
    let ema21 = indicators.get("ema_21", index)?;
    let ema50 = indicators.get("ema_50", index)?;
    let ema21_prev = indicators.get("ema_21", index - EMA_SLOPE_PERIOD)?;
    let adx = indicators.get("adx_14", index)?;
    let atr = indicators.get("atr_14", index)?;
    if [price, ema9, ema21, ema50, ema21_prev, adx, atr].iter().any(|v| v.is_nan()) {
        return None;
    }

    let ema_slope_pct = if ema21_prev != 0.0 { (ema21 - ema21_prev) / ema21_prev * 100.0 } else { 0.0 };
    let bullish_aligned = price > ema9 && ema9 > ema21 && ema21 > ema50;
    let bearish_aligned = price < ema9 && ema9 < ema21 && ema21 < ema50;

    let trend = classify_trend(adx, ema_slope_pct, bullish_aligned, bearish_aligned);

    let atr_window_mean = mean_of_series(indicators.get_series("atr_14")?, index, LOOKBACK_WINDOW);
    let atr_ratio = if atr_window_mean > 0.0 { atr / atr_window_mean } else { 1.0 };
    let volatility = classify_ratio_vol(atr_ratio);

    let (liquidity, vol_ratio) = classify_liquidity(bars, index);

    Some(Regime {
        trend,
        volatility,
        liquidity,
        adx,
        ema_slope_pct,
        atr_ratio,
        vol_ratio,
        price,
        ema_9: ema9,
        ema_21: ema21,
        ema_50: ema50,
    })
}

fn classify_trend(adx: f64, slope: f64, bullish_aligned: bool, bearish_aligned: bool) -> Trend {
    if adx > 25.0 {
        if slope > 0.5 || bullish_aligned {
            Trend::StrongUptrend
        } else if slope < -0.5 || bearish_aligned {
            Trend::StrongDowntrend
        } else if slope > 0.0 {
            Trend::WeakUptrend
        } else {
            Trend::WeakDowntrend
        }
    } else if adx < 20.0 {
        Trend::Ranging
    } else if slope > 0.2 {
        Trend::WeakUptrend
    } else if slope < -0.2 {
        Trend::WeakDowntrend
    } else {
        Trend::Ranging
    }
}

fn classify_ratio_vol(atr_ratio: f64) -> Volatility {
    if atr_ratio > 1.5 {
        Volatility::HighVol
    } else if atr_ratio < 0.7 {
        Volatility::LowVol
    } else {
        Volatility::NormalVol
    }
}

fn classify_liquidity(bars: &[Bar], index: usize) -> (Liquidity, f64) {
    let window_start = index.saturating_sub(LOOKBACK_WINDOW - 1);
    let window = &bars[window_start..=index];
    let mean_volume = window.iter().map(|b| b.volume as f64).sum::<f64>() / window.len() as f64;
    if mean_volume <= 0.0 {
        tracing::warn!(bar_index = index, "no volume data available, defaulting liquidity to NORMAL");
        return (Liquidity::NormalLiq, 1.0);
    }
    let vol_ratio = bars[index].volume as f64 / mean_volume;
    let liquidity = if vol_ratio > 1.5 {
        Liquidity::HighLiq
    } else if vol_ratio < 0.7 {
        Liquidity::LowLiq
    } else {
        Liquidity::NormalLiq
    };
    (liquidity, vol_ratio)
}

fn mean_of_series(series: &[f64], index: usize, window: usize) -> f64 {
    let start = index.saturating_sub(window - 1);
    let slice = &series[start..=index];
    let valid: Vec<f64> = slice.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return 0.0;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

/// Classify every bar from index 30 onward, skipping (and logging) indices
/// whose classification fails rather than aborting the whole scan.
pub fn regime_history(bars: &[Bar], indicators: &IndicatorValues) -> Vec<Regime> {
    let mut out = Vec::new();
    for i in WARMUP_BARS..bars.len() {
        match classify(bars, indicators, i) {
            Some(regime) => out.push(regime),
            None => tracing::debug!(bar_index = i, "regime classification skipped, insufficient data"),
        }
    }
    out
}

/// Percentage distribution of each trend/volatility/liquidity value across a
/// regime history, plus the most recent regime.
pub fn regime_summary(history: &[Regime]) -> RegimeSummary {
    use std::collections::BTreeMap;

    fn percentages<T: Ord + Clone>(values: impl Iterator<Item = T>, total: usize) -> Vec<(T, f64)> {
        let mut counts: BTreeMap<T, usize> = BTreeMap::new();
        for v in values {
            *counts.entry(v).or_insert(0) += 1;
        }
        counts.into_iter().map(|(k, c)| (k, c as f64 / total as f64 * 100.0)).collect()
    }

    if history.is_empty() {
        return RegimeSummary { trend_pct: Vec::new(), volatility_pct: Vec::new(), liquidity_pct: Vec::new(), most_recent: None };
    }
    let total = history.len();
    RegimeSummary {
        trend_pct: percentages(history.iter().map(|r| r.trend), total),
        volatility_pct: percentages(history.iter().map(|r| r.volatility), total),
        liquidity_pct: percentages(history.iter().map(|r| r.liquidity), total),
        most_recent: history.last().cloned(),
    }
}
