//! Cross-asset sentiment analysis over gold plus a correlated basket
//! (USD index, 10Y yield, broad-equity index, silver, crude).

use std::collections::BTreeMap;

use crate::domain::{Bar, CorrelationEntry, SentimentLabel, SentimentReport};

const ROLLING_WINDOW: usize = 20;
const DIVERGENCE_THRESHOLD: f64 = 0.3;
const DEADBAND_PCT: f64 = 0.3;
const LOOKBACK: usize = 5;

/// Analyze sentiment from gold's bar series and a basket of other series,
/// keyed by symbol. An empty basket yields the unconditional NEUTRAL default.
pub fn analyze(gold: &[Bar], basket: &BTreeMap<String, Vec<Bar>>) -> SentimentReport {
    if basket.is_empty() {
        return SentimentReport::neutral_default();
    }

    let gold_returns = pct_returns(gold);
    let mut correlations = Vec::new();
    for (symbol, bars) in basket {
        let other_returns = pct_returns(bars);
        let (g, o) = align(&gold_returns, &other_returns);
        if g.len() < ROLLING_WINDOW + 1 {
            continue;
        }
        let correlation = pearson(&g, &o);
        let rolling_correlation = pearson(&g[g.len() - ROLLING_WINDOW..], &o[o.len() - ROLLING_WINDOW..]);
        let prior_start = g.len().saturating_sub(2 * ROLLING_WINDOW);
        let prior_end = g.len().saturating_sub(ROLLING_WINDOW);
        let correlation_change = if prior_end > prior_start {
            let prior = pearson(&g[prior_start..prior_end], &o[prior_start..prior_end]);
            rolling_correlation - prior
        } else {
            0.0
        };
        correlations.push(CorrelationEntry {
            symbol: symbol.clone(),
            correlation,
            rolling_correlation,
            correlation_change,
            diverging: correlation_change.abs() > DIVERGENCE_THRESHOLD,
        });
    }

    let gold_move = lookback_pct_change(gold, LOOKBACK);
    let equity_move = basket.get("EQUITY").map(|b| lookback_pct_change(b, LOOKBACK));
    let usd_move = basket.get("USD").map(|b| lookback_pct_change(b, LOOKBACK));

    let (label, confidence) = classify_sentiment(gold_move, equity_move, usd_move);

    SentimentReport { label, confidence, correlations }
}

fn classify_sentiment(gold: Option<f64>, equity: Option<f64>, usd: Option<f64>) -> (SentimentLabel, f64) {
    let (Some(gold), Some(equity), Some(usd)) = (gold, equity, usd) else {
        return (SentimentLabel::Neutral, 0.5);
    };

    let gold_up = gold > DEADBAND_PCT;
    let gold_down = gold < -DEADBAND_PCT;
    let equity_up = equity > DEADBAND_PCT;
    let equity_down = equity < -DEADBAND_PCT;
    let usd_up = usd > DEADBAND_PCT;
    let usd_down = usd < -DEADBAND_PCT;

    let full_confidence = (gold.abs() + equity.abs() + usd.abs()).min(3.0) / 3.0;

    if equity_up && usd_down && gold_up {
        (SentimentLabel::RiskOn, full_confidence)
    } else if equity_down && usd_up && gold_up {
        (SentimentLabel::RiskOff, full_confidence)
    } else if equity_down && gold_up {
        (SentimentLabel::RiskOff, full_confidence * 0.7)
    } else if equity_up && gold_up {
        (SentimentLabel::RiskOn, full_confidence * 0.7)
    } else if (gold_up && equity_up && usd_up) || (gold_down && equity_down && usd_down) {
        (SentimentLabel::Uncertain, 0.3)
    } else {
        (SentimentLabel::Neutral, 0.5)
    }
}

fn pct_returns(bars: &[Bar]) -> Vec<(chrono::NaiveDate, f64)> {
    bars.windows(2)
        .filter_map(|w| {
            if w[0].close == 0.0 {
                return None;
            }
            Some((w[1].date, (w[1].close - w[0].close) / w[0].close * 100.0))
        })
        .collect()
}

fn align(a: &[(chrono::NaiveDate, f64)], b: &[(chrono::NaiveDate, f64)]) -> (Vec<f64>, Vec<f64>) {
    let b_map: BTreeMap<_, _> = b.iter().cloned().collect();
    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    for &(date, value) in a {
        if let Some(&other) = b_map.get(&date) {
            out_a.push(value);
            out_b.push(other);
        }
    }
    (out_a, out_b)
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

fn lookback_pct_change(bars: &[Bar], lookback: usize) -> f64 {
    if bars.len() <= lookback {
        return 0.0;
    }
    let past = bars[bars.len() - 1 - lookback].close;
    let now = bars[bars.len() - 1].close;
    if past == 0.0 {
        return 0.0;
    }
    (now - past) / past * 100.0
}

/// Read-only view over the correlation entries already computed by `analyze`.
pub fn correlation_matrix(report: &SentimentReport) -> BTreeMap<String, f64> {
    report.correlation_matrix()
}

/// Rolling correlation series, one value per basket symbol snapshot — this
/// analyzer only ever holds the latest snapshot, so the "series" is a
/// single-element view; kept as a distinct function to mirror the
/// full-overlap correlation accessor above it.
pub fn rolling_correlation_series(report: &SentimentReport, symbol: &str) -> Vec<Option<f64>> {
    vec![report.correlations.iter().find(|c| c.symbol == symbol).map(|c| c.rolling_correlation)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_with_closes(closes: &[f64]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                symbol: "X".into(),
                date: base + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn empty_basket_yields_neutral_default() {
        let gold = bars_with_closes(&[100.0, 101.0, 102.0]);
        let report = analyze(&gold, &BTreeMap::new());
        assert_eq!(report.label, SentimentLabel::Neutral);
        assert_eq!(report.confidence, 0.5);
        assert!(report.correlations.is_empty());
    }

    #[test]
    fn risk_on_when_equity_up_usd_down_gold_up() {
        let mut gold_prices = vec![100.0; 30];
        for i in 24..30 {
            gold_prices[i] = 100.0 + (i - 23) as f64 * 1.0;
        }
        let mut equity_prices = gold_prices.clone();
        for i in 24..30 {
            equity_prices[i] = 100.0 + (i - 23) as f64 * 1.0;
        }
        let mut usd_prices = vec![100.0; 30];
        for i in 24..30 {
            usd_prices[i] = 100.0 - (i - 23) as f64 * 1.0;
        }
        let gold = bars_with_closes(&gold_prices);
        let mut basket = BTreeMap::new();
        basket.insert("EQUITY".to_string(), bars_with_closes(&equity_prices));
        basket.insert("USD".to_string(), bars_with_closes(&usd_prices));
        let report = analyze(&gold, &basket);
        assert_eq!(report.label, SentimentLabel::RiskOn);
    }
}
