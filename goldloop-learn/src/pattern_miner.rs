//! Pattern Miner — discovers `DiscoveredPattern`s in four families from a
//! labeled outcome history.
//!
//! Concatenation and dedup policy across multiple outcome histories is
//! left to the caller (see `crate::domain::outcome_record`): the Miner
//! only ever sees a plain `&[OutcomeRecord]` slice.

use std::collections::BTreeMap;

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;

use goldloop_core::domain::{Session, Trend};

use crate::domain::{Condition, Direction, DiscoveredPattern, Operator, OutcomeRecord, PatternFamily, WinLoss};

const SINGLE_INDICATORS: [&str; 4] = ["rsi", "stoch_k", "adx", "atr_percentile"];

/// Threshold grids per indicator, matching the plausible range of each
/// reading.
fn threshold_grid(indicator: &str) -> Vec<f64> {
    match indicator {
        "rsi" | "stoch_k" => (10..=90).step_by(10).map(|v| v as f64).collect(),
        "adx" => (10..=50).step_by(5).map(|v| v as f64).collect(),
        "atr_percentile" => (10..=90).step_by(10).map(|v| v as f64).collect(),
        _ => Vec::new(),
    }
}

fn indicator_value(record: &OutcomeRecord, indicator: &str) -> f64 {
    match indicator {
        "rsi" => record.rsi,
        "stoch_k" => record.stoch_k,
        "adx" => record.adx,
        "atr_percentile" => record.atr_percentile,
        _ => f64::NAN,
    }
}

fn win_rate_and_pf(rows: &[&OutcomeRecord]) -> (f64, f64) {
    if rows.is_empty() {
        return (0.0, 0.0);
    }
    let wins: Vec<&&OutcomeRecord> = rows.iter().filter(|r| r.outcome == WinLoss::Win).collect();
    let losses: Vec<&&OutcomeRecord> = rows.iter().filter(|r| r.outcome == WinLoss::Loss).collect();
    let win_rate = wins.len() as f64 / rows.len() as f64 * 100.0;
    let gross_win: f64 = wins.iter().map(|r| r.pnl.abs()).sum();
    let gross_loss: f64 = losses.iter().map(|r| r.pnl.abs()).sum();
    let profit_factor = if gross_loss > 0.0 { gross_win / gross_loss } else { 0.0 };
    (win_rate, profit_factor)
}

fn make_candidate(
    family: PatternFamily,
    conditions: BTreeMap<String, Condition>,
    direction: Direction,
    rows: &[&OutcomeRecord],
    best_regime: Option<Trend>,
    best_session: Option<Session>,
) -> Option<DiscoveredPattern> {
    let (win_rate, profit_factor) = win_rate_and_pf(rows);
    let sample_size = rows.len();
    if !DiscoveredPattern::passes_gates(sample_size, win_rate, profit_factor) {
        return None;
    }
    let confidence = DiscoveredPattern::confidence_for(win_rate, profit_factor, sample_size, family);
    Some(DiscoveredPattern { family, conditions, direction, win_rate, profit_factor, sample_size, best_regime, best_session, confidence })
}

fn single_indicator_patterns(history: &[OutcomeRecord]) -> Vec<DiscoveredPattern> {
    let mut out = Vec::new();
    for &indicator in &SINGLE_INDICATORS {
        for threshold in threshold_grid(indicator) {
            for op in [Operator::Lt, Operator::Gt] {
                for direction in [Direction::Long, Direction::Short] {
                    let rows: Vec<&OutcomeRecord> = history
                        .iter()
                        .filter(|r| r.direction == direction && op.evaluate(indicator_value(r, indicator), threshold))
                        .collect();
                    let mut conditions = BTreeMap::new();
                    conditions.insert(indicator.to_string(), Condition { op, threshold });
                    if let Some(pattern) =
                        make_candidate(PatternFamily::SingleIndicator, conditions, direction, &rows, None, None)
                    {
                        out.push(pattern);
                    }
                }
            }
        }
    }
    out
}

/// Fixed catalog of 2-condition combos, e.g. "stoch_k < 25 AND rsi > 45 ->
/// LONG".
fn combo_catalog() -> Vec<(&'static str, Operator, f64, &'static str, Operator, f64, Direction)> {
    vec![
        ("stoch_k", Operator::Lt, 25.0, "rsi", Operator::Gt, 45.0, Direction::Long),
        ("stoch_k", Operator::Gt, 75.0, "rsi", Operator::Lt, 55.0, Direction::Short),
        ("adx", Operator::Gt, 25.0, "rsi", Operator::Lt, 40.0, Direction::Long),
        ("adx", Operator::Gt, 25.0, "rsi", Operator::Gt, 60.0, Direction::Short),
        ("atr_percentile", Operator::Lt, 40.0, "stoch_k", Operator::Lt, 30.0, Direction::Long),
        ("atr_percentile", Operator::Lt, 40.0, "stoch_k", Operator::Gt, 70.0, Direction::Short),
    ]
}

fn combo_patterns(history: &[OutcomeRecord]) -> Vec<DiscoveredPattern> {
    let mut out = Vec::new();
    for (ind1, op1, th1, ind2, op2, th2, direction) in combo_catalog() {
        let rows: Vec<&OutcomeRecord> = history
            .iter()
            .filter(|r| {
                r.direction == direction
                    && op1.evaluate(indicator_value(r, ind1), th1)
                    && op2.evaluate(indicator_value(r, ind2), th2)
            })
            .collect();
        let mut conditions = BTreeMap::new();
        conditions.insert(ind1.to_string(), Condition { op: op1, threshold: th1 });
        conditions.insert(ind2.to_string(), Condition { op: op2, threshold: th2 });
        if let Some(pattern) = make_candidate(PatternFamily::Combo, conditions, direction, &rows, None, None) {
            out.push(pattern);
        }
    }
    out
}

fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// For each regime x direction: average the winning rows' indicator
/// values to derive this regime's canonical thresholds (`Gt` for rsi/adx,
/// matching "winners tend to have this reading or higher").
fn regime_specific_patterns(history: &[OutcomeRecord]) -> Vec<DiscoveredPattern> {
    let mut out = Vec::new();
    let regimes = [Trend::StrongUptrend, Trend::WeakUptrend, Trend::Ranging, Trend::WeakDowntrend, Trend::StrongDowntrend];
    for regime in regimes {
        for direction in [Direction::Long, Direction::Short] {
            let rows: Vec<&OutcomeRecord> = history.iter().filter(|r| r.regime == regime && r.direction == direction).collect();
            let winners: Vec<&OutcomeRecord> = rows.iter().filter(|r| r.outcome == WinLoss::Win).copied().collect();
            if winners.is_empty() {
                continue;
            }
            let avg_rsi = avg(&winners.iter().map(|r| r.rsi).collect::<Vec<_>>());
            let mut conditions = BTreeMap::new();
            conditions.insert("rsi".to_string(), Condition { op: Operator::Gt, threshold: avg_rsi });
            if let Some(pattern) =
                make_candidate(PatternFamily::RegimeSpecific, conditions, direction, &rows, Some(regime), None)
            {
                out.push(pattern);
            }
        }
    }
    out
}

fn session_specific_patterns(history: &[OutcomeRecord]) -> Vec<DiscoveredPattern> {
    let mut out = Vec::new();
    let sessions = [Session::Asia, Session::London, Session::Overlap, Session::Newyork];
    for session in sessions {
        for direction in [Direction::Long, Direction::Short] {
            let rows: Vec<&OutcomeRecord> = history.iter().filter(|r| r.session == session && r.direction == direction).collect();
            let winners: Vec<&OutcomeRecord> = rows.iter().filter(|r| r.outcome == WinLoss::Win).copied().collect();
            if winners.is_empty() {
                continue;
            }
            let avg_stoch = avg(&winners.iter().map(|r| r.stoch_k).collect::<Vec<_>>());
            let mut conditions = BTreeMap::new();
            conditions.insert("stoch_k".to_string(), Condition { op: Operator::Gt, threshold: avg_stoch });
            if let Some(pattern) =
                make_candidate(PatternFamily::SessionSpecific, conditions, direction, &rows, None, Some(session))
            {
                out.push(pattern);
            }
        }
    }
    out
}

/// Mine every family from `history`, sorted by confidence descending.
pub fn mine(history: &[OutcomeRecord]) -> Vec<DiscoveredPattern> {
    let mut patterns = single_indicator_patterns(history);
    patterns.extend(combo_patterns(history));
    patterns.extend(regime_specific_patterns(history));
    patterns.extend(session_specific_patterns(history));
    patterns.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
    patterns
}

/// When no real history is available and the caller explicitly opts in,
/// generate a seeded synthetic dataset (1000 rows, seed 42) rather than
/// silently fabricating data.
pub fn synthetic_history(allow_synthetic_fallback: bool) -> Vec<OutcomeRecord> {
    if !allow_synthetic_fallback {
        return Vec::new();
    }
    tracing::warn!("pattern miner: no outcome history supplied, generating seeded synthetic fallback dataset");
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let regimes = [Trend::StrongUptrend, Trend::WeakUptrend, Trend::Ranging, Trend::WeakDowntrend, Trend::StrongDowntrend];
    let sessions = [Session::Asia, Session::London, Session::Overlap, Session::Newyork];
    let pct = Uniform::new(0.0, 100.0);
    let pnl_dist = Uniform::new(-20.0, 20.0);
    let hold_dist = Uniform::new(15i64, 480);
    let score_dist = Uniform::new(50.0, 95.0);
    let base = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

    (0..1000)
        .map(|i| {
            let rsi = pct.sample(&mut rng);
            let stoch_k = pct.sample(&mut rng);
            let adx = pct.sample(&mut rng) * 0.5;
            let atr_percentile = pct.sample(&mut rng);
            let pnl = pnl_dist.sample(&mut rng);
            let direction = if i % 2 == 0 { Direction::Long } else { Direction::Short };
            OutcomeRecord {
                timestamp: base + chrono::Duration::hours(i),
                price: 2000.0 + pnl,
                rsi,
                stoch_k,
                adx,
                atr_percentile,
                regime: regimes[i as usize % regimes.len()],
                session: sessions[i as usize % sessions.len()],
                direction,
                outcome: if pnl >= 0.0 { WinLoss::Win } else { WinLoss::Loss },
                pnl,
                hold_minutes: hold_dist.sample(&mut rng),
                score: score_dist.sample(&mut rng),
                rule_ids: Vec::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_row(direction: Direction, outcome: WinLoss, rsi: f64, stoch_k: f64, pnl: f64) -> OutcomeRecord {
        OutcomeRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            price: 2000.0,
            rsi,
            stoch_k,
            adx: 20.0,
            atr_percentile: 50.0,
            regime: Trend::Ranging,
            session: Session::London,
            direction,
            outcome,
            pnl,
            hold_minutes: 60,
            score: 65.0,
            rule_ids: Vec::new(),
        }
    }

    #[test]
    fn single_indicator_pattern_requires_sample_size_gate() {
        let history: Vec<OutcomeRecord> = (0..20).map(|_| make_row(Direction::Long, WinLoss::Win, 20.0, 50.0, 10.0)).collect();
        let patterns = single_indicator_patterns(&history);
        assert!(patterns.is_empty(), "20 rows should not clear the 30-sample gate");
    }

    #[test]
    fn single_indicator_pattern_emerges_with_enough_winning_samples() {
        let mut history: Vec<OutcomeRecord> =
            (0..35).map(|_| make_row(Direction::Long, WinLoss::Win, 20.0, 50.0, 10.0)).collect();
        history.extend((0..5).map(|_| make_row(Direction::Long, WinLoss::Loss, 20.0, 50.0, -5.0)));
        let patterns = single_indicator_patterns(&history);
        assert!(patterns.iter().any(|p| p.conditions.contains_key("rsi")));
    }

    #[test]
    fn synthetic_fallback_is_empty_without_explicit_opt_in() {
        assert!(synthetic_history(false).is_empty());
    }

    #[test]
    fn synthetic_fallback_produces_one_thousand_rows_when_opted_in() {
        let history = synthetic_history(true);
        assert_eq!(history.len(), 1000);
    }

    #[test]
    fn mine_output_is_sorted_by_confidence_descending() {
        let history = synthetic_history(true);
        let patterns = mine(&history);
        for window in patterns.windows(2) {
            assert!(window[0].confidence >= window[1].confidence);
        }
    }
}
