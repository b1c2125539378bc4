//! Auto-Tuner — grid-search optimization over `TuningConfig` scalars.

use goldloop_core::domain::{Session, Trend, TuningConfig};

use crate::domain::{OutcomeRecord, WinLoss};

const MIN_FILTERED_ROWS: usize = 20;
const MIN_RESOLVED_ROWS: usize = 10;
const MIN_SEGMENT_ROWS: usize = 50;
const GLOBAL_IMPROVEMENT_THRESHOLD: f64 = 10.0;
const SEGMENT_IMPROVEMENT_THRESHOLD: f64 = 5.0;
/// Auto-Tuner's fitness weight on profit-factor is 15, not the Evolver's
/// and Miner's 20 — a deliberate discrepancy, not a typo to fix.
const PROFIT_FACTOR_WEIGHT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    StochOversold,
    StochOverbought,
    RsiOversold,
    RsiOverbought,
    MinScoreLong,
    MinScoreShort,
    AtrStopMult,
    AtrTpMult,
    AdxMinTrend,
}

impl Param {
    fn candidates(self) -> Vec<f64> {
        match self {
            Param::StochOversold => (10..=30).step_by(5).map(|v| v as f64).collect(),
            Param::StochOverbought => (65..=90).step_by(5).map(|v| v as f64).collect(),
            Param::RsiOversold => (20..=35).step_by(5).map(|v| v as f64).collect(),
            Param::RsiOverbought => (60..=75).step_by(5).map(|v| v as f64).collect(),
            Param::MinScoreLong => (50..=75).step_by(5).map(|v| v as f64).collect(),
            Param::MinScoreShort => (50..=75).step_by(5).map(|v| v as f64).collect(),
            Param::AtrStopMult => vec![1.5, 2.0, 2.5, 3.0],
            Param::AtrTpMult => vec![2.0, 2.5, 3.0, 3.5, 4.0],
            Param::AdxMinTrend => (15..=35).step_by(5).map(|v| v as f64).collect(),
        }
    }

    fn current(self, config: &TuningConfig) -> f64 {
        match self {
            Param::StochOversold => config.stoch_oversold,
            Param::StochOverbought => config.stoch_overbought,
            Param::RsiOversold => config.rsi_oversold,
            Param::RsiOverbought => config.rsi_overbought,
            Param::MinScoreLong => config.min_score_long,
            Param::MinScoreShort => config.min_score_short,
            Param::AtrStopMult => config.atr_stop_mult,
            Param::AtrTpMult => config.atr_tp_mult,
            Param::AdxMinTrend => config.adx_min_trend,
        }
    }
}

const ALL_PARAMS: [Param; 9] = [
    Param::StochOversold,
    Param::StochOverbought,
    Param::RsiOversold,
    Param::RsiOverbought,
    Param::MinScoreLong,
    Param::MinScoreShort,
    Param::AtrStopMult,
    Param::AtrTpMult,
    Param::AdxMinTrend,
];

/// Declared for search-space shape-parity; nothing in this pipeline
/// actually populates or optimizes it.
#[derive(Debug, Clone, Copy, Default)]
#[allow(dead_code)]
pub struct AdxPercentileSearchSpace {
    pub adx_percentile: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ParamOverride {
    pub param: Param,
    pub value: f64,
    pub improvement_pct: f64,
    pub regime: Option<Trend>,
    pub session: Option<Session>,
}

/// The loosened OR admission: a row counts as filtered iff any of
/// stoch/rsi/adx clears the candidate threshold — not a conjunction.
fn admits(record: &OutcomeRecord, param: Param, value: f64) -> bool {
    let stoch_ok = matches!(param, Param::StochOversold) && record.stoch_k < value
        || matches!(param, Param::StochOverbought) && record.stoch_k > value;
    let rsi_ok = matches!(param, Param::RsiOversold) && record.rsi < value
        || matches!(param, Param::RsiOverbought) && record.rsi > value;
    let adx_ok = matches!(param, Param::AdxMinTrend) && record.adx > value;
    // Parameters outside the three threshold families (score/ATR mults)
    // admit unconditionally on a single-row basis; the OR only meaningfully
    // discriminates stoch/rsi/adx.
    !matches!(param, Param::StochOversold | Param::StochOverbought | Param::RsiOversold | Param::RsiOverbought | Param::AdxMinTrend)
        || stoch_ok
        || rsi_ok
        || adx_ok
}

fn fitness(rows: &[&OutcomeRecord]) -> f64 {
    if rows.len() < MIN_RESOLVED_ROWS {
        return 0.0;
    }
    let wins = rows.iter().filter(|r| r.outcome == WinLoss::Win).count();
    let win_rate = wins as f64 / rows.len() as f64 * 100.0;
    let gross_win: f64 = rows.iter().filter(|r| r.outcome == WinLoss::Win).map(|r| r.pnl.abs()).sum();
    let gross_loss: f64 = rows.iter().filter(|r| r.outcome == WinLoss::Loss).map(|r| r.pnl.abs()).sum();
    let profit_factor = if gross_loss > 0.0 { gross_win / gross_loss } else { 0.0 };
    ((win_rate - 50.0) * 2.0 + (profit_factor - 1.0) * PROFIT_FACTOR_WEIGHT + (rows.len() as f64 / 5.0).min(20.0)).max(0.0)
}

fn improvement_pct(candidate_fitness: f64, baseline_fitness: f64) -> f64 {
    if baseline_fitness <= 0.0 {
        0.0
    } else {
        (candidate_fitness - baseline_fitness) / baseline_fitness * 100.0
    }
}

/// Evaluate every candidate value for `param` against `history` (already
/// filtered to the regime/session subset, or the whole set for a global
/// pass), returning the best improving override if the admission and
/// threshold gates clear.
fn evaluate_param(param: Param, history: &[OutcomeRecord], config: &TuningConfig, required_improvement: f64) -> Option<(f64, f64)> {
    let baseline = fitness(&history.iter().collect::<Vec<_>>());
    let mut best: Option<(f64, f64)> = None;
    for value in param.candidates() {
        if (value - param.current(config)).abs() < f64::EPSILON {
            continue;
        }
        let filtered: Vec<&OutcomeRecord> = history.iter().filter(|r| admits(r, param, value)).collect();
        if filtered.len() < MIN_FILTERED_ROWS {
            continue;
        }
        let resolved: Vec<&OutcomeRecord> = filtered;
        if resolved.len() < MIN_RESOLVED_ROWS {
            continue;
        }
        let candidate_fitness = fitness(&resolved);
        let improvement = improvement_pct(candidate_fitness, baseline);
        if improvement >= required_improvement {
            let better = match best {
                Some((_, best_improvement)) => improvement > best_improvement,
                None => true,
            };
            if better {
                best = Some((value, improvement));
            }
        }
    }
    best
}

/// Run the full tuning pass: global, then per-regime (5 named regimes),
/// then per-session (4 named sessions), for every parameter.
pub fn tune(history: &[OutcomeRecord], config: &TuningConfig) -> Vec<ParamOverride> {
    let mut overrides = Vec::new();

    for param in ALL_PARAMS {
        if let Some((value, improvement)) = evaluate_param(param, history, config, GLOBAL_IMPROVEMENT_THRESHOLD) {
            overrides.push(ParamOverride { param, value, improvement_pct: improvement, regime: None, session: None });
        }
    }

    for regime in [Trend::StrongUptrend, Trend::WeakUptrend, Trend::Ranging, Trend::WeakDowntrend, Trend::StrongDowntrend] {
        let subset: Vec<OutcomeRecord> = history.iter().filter(|r| r.regime == regime).cloned().collect();
        if subset.len() < MIN_SEGMENT_ROWS {
            continue;
        }
        for param in ALL_PARAMS {
            if let Some((value, improvement)) = evaluate_param(param, &subset, config, SEGMENT_IMPROVEMENT_THRESHOLD) {
                overrides.push(ParamOverride { param, value, improvement_pct: improvement, regime: Some(regime), session: None });
            }
        }
    }

    for session in [Session::Asia, Session::London, Session::Overlap, Session::Newyork] {
        let subset: Vec<OutcomeRecord> = history.iter().filter(|r| r.session == session).cloned().collect();
        if subset.len() < MIN_SEGMENT_ROWS {
            continue;
        }
        for param in ALL_PARAMS {
            if let Some((value, improvement)) = evaluate_param(param, &subset, config, SEGMENT_IMPROVEMENT_THRESHOLD) {
                overrides.push(ParamOverride { param, value, improvement_pct: improvement, regime: None, session: Some(session) });
            }
        }
    }

    overrides
}

fn param_name(param: Param) -> &'static str {
    match param {
        Param::StochOversold => "stoch_oversold",
        Param::StochOverbought => "stoch_overbought",
        Param::RsiOversold => "rsi_oversold",
        Param::RsiOverbought => "rsi_overbought",
        Param::MinScoreLong => "min_score_long",
        Param::MinScoreShort => "min_score_short",
        Param::AtrStopMult => "atr_stop_mult",
        Param::AtrTpMult => "atr_tp_mult",
        Param::AdxMinTrend => "adx_min_trend",
    }
}

/// Apply a set of overrides to a base config: global overrides replace
/// the flat scalar, regime/session-scoped overrides are folded into the
/// config's adjustment maps so they only apply when that regime/session
/// is in effect.
pub fn apply_overrides(base: &TuningConfig, overrides: &[ParamOverride]) -> TuningConfig {
    let mut config = base.clone();
    for o in overrides {
        if let Some(regime) = o.regime {
            config.regime_adjustments.entry(format!("{regime:?}")).or_default().insert(param_name(o.param).to_string(), o.value);
            continue;
        }
        if let Some(session) = o.session {
            config.session_adjustments.entry(format!("{session:?}")).or_default().insert(param_name(o.param).to_string(), o.value);
            continue;
        }
        match o.param {
            Param::StochOversold => config.stoch_oversold = o.value,
            Param::StochOverbought => config.stoch_overbought = o.value,
            Param::RsiOversold => config.rsi_oversold = o.value,
            Param::RsiOverbought => config.rsi_overbought = o.value,
            Param::MinScoreLong => config.min_score_long = o.value,
            Param::MinScoreShort => config.min_score_short = o.value,
            Param::AtrStopMult => config.atr_stop_mult = o.value,
            Param::AtrTpMult => config.atr_tp_mult = o.value,
            Param::AdxMinTrend => config.adx_min_trend = o.value,
        }
    }
    config
}
