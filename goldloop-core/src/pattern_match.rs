//! Pattern Matcher — encode a bar as a discrete `Setup`, scan history for
//! analogues, and aggregate their forward outcomes into a `PatternAnalysis`.

use crate::components::IndicatorValues;
use crate::domain::{
    Bar, EmaCross, Level, PatternAnalysis, PatternMatch, PatternPrediction, Regime, Setup,
    TuningConfig,
};

/// Index at which the regime series begins (see `regime_classify::regime_history`);
/// `regimes[i - REGIME_WARMUP]` is the regime for bar `i`.
const REGIME_WARMUP: usize = 30;
const SCAN_FORWARD_HORIZON: usize = 24;

/// Build the 6-field discrete fingerprint for bar `index`, given the regime
/// series produced by `regime_classify::regime_history` (which itself starts
/// at bar 30). Returns `None` if the regime or any indicator has not warmed
/// up at this index — a class-2 non-fatal absence, not an error.
pub fn build_setup(
    indicators: &IndicatorValues,
    regimes: &[Regime],
    index: usize,
    config: &TuningConfig,
) -> Option<Setup> {
    if index < REGIME_WARMUP || index == 0 {
        return None;
    }
    let regime = regimes.get(index - REGIME_WARMUP)?;

    let ema9 = indicators.get("ema_9", index)?;
    let ema21 = indicators.get("ema_21", index)?;
    let ema9_prev = indicators.get("ema_9", index - 1)?;
    let ema21_prev = indicators.get("ema_21", index - 1)?;
    let stoch_k = indicators.get("stoch_k", index)?;
    let rsi = indicators.get("rsi_14", index)?;
    if [ema9, ema21, ema9_prev, ema21_prev, stoch_k, rsi].iter().any(|v| v.is_nan()) {
        return None;
    }

    let ema_cross = if ema9_prev <= ema21_prev && ema9 > ema21 {
        EmaCross::BullCross
    } else if ema9_prev >= ema21_prev && ema9 < ema21 {
        EmaCross::BearCross
    } else if ema9 > ema21 {
        EmaCross::BullAligned
    } else {
        EmaCross::BearAligned
    };

    let stoch_level = Level::from_oscillator(stoch_k, config.stoch_oversold, config.stoch_overbought);
    let rsi_level = Level::from_oscillator(rsi, config.rsi_oversold, config.rsi_overbought);

    Some(Setup {
        trend: regime.trend,
        volatility: regime.volatility,
        liquidity: regime.liquidity,
        ema_cross,
        stoch_level,
        rsi_level,
    })
}

/// Percent close-to-close change from bar `i` to bar `i + horizon`. `None`
/// if the forward bar is out of range or `close` at `i` is zero.
fn forward_outcome(bars: &[Bar], i: usize, horizon: usize) -> Option<f64> {
    let j = i + horizon;
    if j >= bars.len() || bars[i].close == 0.0 {
        return None;
    }
    Some((bars[j].close - bars[i].close) / bars[i].close * 100.0)
}

/// Scan `[30, len(bars) - 24)` for historical analogues of `reference`,
/// collecting forward outcomes at +1/+4/+24 bars for every match whose
/// similarity is at least `Setup::DEFAULT_SIMILARITY_THRESHOLD`.
pub fn scan(
    bars: &[Bar],
    indicators: &IndicatorValues,
    regimes: &[Regime],
    config: &TuningConfig,
    reference: &Setup,
) -> Vec<PatternMatch> {
    if bars.len() <= REGIME_WARMUP + SCAN_FORWARD_HORIZON {
        return Vec::new();
    }
    let scan_end = bars.len() - SCAN_FORWARD_HORIZON;
    let mut matches = Vec::new();
    for i in REGIME_WARMUP..scan_end {
        let Some(setup) = build_setup(indicators, regimes, i, config) else { continue };
        let similarity = setup.similarity(reference);
        if similarity < Setup::DEFAULT_SIMILARITY_THRESHOLD {
            continue;
        }
        matches.push(PatternMatch {
            setup,
            similarity,
            outcome_1b: forward_outcome(bars, i, 1),
            outcome_4b: forward_outcome(bars, i, 4),
            outcome_24b: forward_outcome(bars, i, 24),
        });
    }
    matches
}

/// Aggregate a set of matches into a prediction. Zero matches of any kind
/// short-circuits to the NEUTRAL/50/50/0-confidence default directly — a
/// distinct fallback from the <5/<10-match confidence scaling below.
pub fn aggregate(matches: &[PatternMatch]) -> PatternAnalysis {
    if matches.is_empty() {
        return PatternAnalysis::no_matches_default();
    }

    let with_outcome: Vec<f64> = matches.iter().filter_map(|m| m.outcome_24b).collect();
    if with_outcome.is_empty() {
        return PatternAnalysis { matches_found: matches.len(), ..PatternAnalysis::no_matches_default() };
    }

    let total = with_outcome.len();
    let bullish_count = with_outcome.iter().filter(|&&o| o > 0.0).count();
    let bearish_count = with_outcome.iter().filter(|&&o| o < 0.0).count();
    let bullish_success_rate = bullish_count as f64 / total as f64 * 100.0;
    let bearish_success_rate = bearish_count as f64 / total as f64 * 100.0;
    let avg_outcome_24b = with_outcome.iter().sum::<f64>() / total as f64;
    let matches_found = matches.len();

    let prediction = if bullish_success_rate > 60.0 {
        PatternPrediction::Bullish
    } else if bearish_success_rate > 60.0 {
        PatternPrediction::Bearish
    } else {
        PatternPrediction::Neutral
    };

    let raw_confidence = match prediction {
        PatternPrediction::Bullish => (bullish_success_rate - 50.0) / 50.0,
        PatternPrediction::Bearish => (bearish_success_rate - 50.0) / 50.0,
        PatternPrediction::Neutral => 1.0 - (bullish_success_rate - 50.0).abs() / 50.0,
    };
    let scaled = if matches_found < 5 {
        raw_confidence * 0.5
    } else if matches_found < 10 {
        raw_confidence * 0.75
    } else {
        raw_confidence
    };
    let confidence = scaled.clamp(0.0, 1.0);

    PatternAnalysis { prediction, bullish_success_rate, bearish_success_rate, avg_outcome_24b, confidence, matches_found }
}

/// Convenience: scan then aggregate in one call.
pub fn analyze(
    bars: &[Bar],
    indicators: &IndicatorValues,
    regimes: &[Regime],
    config: &TuningConfig,
    reference: &Setup,
) -> PatternAnalysis {
    aggregate(&scan(bars, indicators, regimes, config, reference))
}
