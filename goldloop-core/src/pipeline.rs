//! Analysis pipeline — wires indicator computation, regime classification,
//! cross-market sentiment, pattern matching, and signal scoring into the
//! single orchestration point both the CLI and the learning runner call
//! into, rather than re-deriving the wiring at each call site.

use std::collections::BTreeMap;

use crate::components::{Indicator, IndicatorValues};
use crate::domain::{Bar, PatternAnalysis, Regime, RegimeSummary, Signal, SentimentReport, TuningConfig};
use crate::indicators::{Adx, Atr, Ema, Rsi, Stochastic};
use crate::pattern_match;
use crate::regime_classify;
use crate::sentiment_analyze;

/// Precompute the fixed indicator set required downstream: `ema_9`,
/// `ema_21`, `ema_50`, `adx_14`, `atr_14`, `stoch_k`, `rsi_14`.
pub fn compute_indicators(bars: &[Bar]) -> IndicatorValues {
    let series: Vec<Box<dyn Indicator>> = vec![
        Box::new(Ema::new(9)),
        Box::new(Ema::new(21)),
        Box::new(Ema::new(50)),
        Box::new(Adx::new(14)),
        Box::new(Atr::new(14)),
        Box::new(Stochastic::percent_k(14, 3, 3)),
        Box::new(Rsi::new(14)),
    ];
    let mut values = IndicatorValues::new();
    for indicator in &series {
        values.insert(indicator.name().to_string(), indicator.compute(bars));
    }
    values
}

/// The full state computed for a single point in time: regime history over
/// the whole input (for the summary and pattern scan), cross-market
/// sentiment, pattern analogues for the latest bar, and its signal.
pub struct AnalysisSnapshot {
    pub indicators: IndicatorValues,
    pub regime_history: Vec<Regime>,
    pub regime_summary: RegimeSummary,
    pub sentiment: SentimentReport,
    pub pattern: PatternAnalysis,
    pub signal: Signal,
}

/// Run the pipeline for the most recent bar in `bars`. Returns `None` if
/// `bars` is empty, or if the latest bar has not warmed up enough for
/// regime classification or setup encoding — both class-2 absence
/// conditions, not errors.
pub fn analyze_latest(bars: &[Bar], basket: &BTreeMap<String, Vec<Bar>>, config: &TuningConfig) -> Option<AnalysisSnapshot> {
    if bars.is_empty() {
        return None;
    }
    let indicators = compute_indicators(bars);
    let regime_history = regime_classify::regime_history(bars, &indicators);
    let regime_summary = regime_classify::regime_summary(&regime_history);
    let sentiment = sentiment_analyze::analyze(bars, basket);

    let index = bars.len() - 1;
    let regime = regime_classify::classify(bars, &indicators, index)?;
    let setup = pattern_match::build_setup(&indicators, &regime_history, index, config)?;
    let pattern = pattern_match::analyze(bars, &indicators, &regime_history, config, &setup);

    let timestamp = bars[index].date.and_hms_opt(0, 0, 0)?;
    let signal = crate::scoring::score(timestamp, bars[index].close, &indicators, index, &regime, &pattern, &sentiment, config);

    Some(AnalysisSnapshot { indicators, regime_history, regime_summary, sentiment, pattern, signal })
}
