//! Performance Analyzer — aggregate and segmented metrics over completed
//! outcomes: overall, by regime, by session, and by score band.

use std::collections::BTreeMap;

use goldloop_core::domain::{Session, Trend};

use crate::domain::{Direction, OutcomeRecord, WinLoss};

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct PeriodMetrics {
    pub total_signals: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_hold_minutes: f64,
}

/// `total_signals, wins, losses, win_rate = wins/total*100, profit_factor =
/// sum(|win pnl|) / sum(|loss pnl|)` — 0 when there are no losses, to keep
/// the type honest rather than floor the denominator at an arbitrary
/// epsilon.
pub fn period_metrics(records: &[OutcomeRecord]) -> PeriodMetrics {
    let total_signals = records.len();
    let wins: Vec<&OutcomeRecord> = records.iter().filter(|r| r.outcome == WinLoss::Win).collect();
    let losses: Vec<&OutcomeRecord> = records.iter().filter(|r| r.outcome == WinLoss::Loss).collect();

    let win_rate = if total_signals > 0 { wins.len() as f64 / total_signals as f64 * 100.0 } else { 0.0 };
    let gross_win: f64 = wins.iter().map(|r| r.pnl.abs()).sum();
    let gross_loss: f64 = losses.iter().map(|r| r.pnl.abs()).sum();
    let profit_factor = if gross_loss > 0.0 { gross_win / gross_loss } else { 0.0 };
    let avg_win = if !wins.is_empty() { gross_win / wins.len() as f64 } else { 0.0 };
    let avg_loss = if !losses.is_empty() { -gross_loss / losses.len() as f64 } else { 0.0 };
    let largest_win = wins.iter().map(|r| r.pnl).fold(0.0, f64::max);
    let largest_loss = losses.iter().map(|r| r.pnl).fold(0.0, f64::min);
    let avg_hold_minutes = if total_signals > 0 {
        records.iter().map(|r| r.hold_minutes as f64).sum::<f64>() / total_signals as f64
    } else {
        0.0
    };

    PeriodMetrics {
        total_signals,
        wins: wins.len(),
        losses: losses.len(),
        win_rate,
        profit_factor,
        avg_win,
        avg_loss,
        largest_win,
        largest_loss,
        avg_hold_minutes,
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Segmentation<K> {
    pub by_key: BTreeMap<K, PeriodMetrics>,
    pub best: Option<K>,
    pub worst: Option<K>,
}

/// Breaks win-rate out by an arbitrary key (regime, session), keeping
/// best/worst by win-rate, ties broken by first-encounter order.
fn segment_by<K: Ord + Clone, F: Fn(&OutcomeRecord) -> K>(records: &[OutcomeRecord], key_fn: F) -> Segmentation<K> {
    let mut order: Vec<K> = Vec::new();
    let mut groups: BTreeMap<K, Vec<OutcomeRecord>> = BTreeMap::new();
    for r in records {
        let key = key_fn(r);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(r.clone());
    }

    let mut by_key = BTreeMap::new();
    for key in &order {
        by_key.insert(key.clone(), period_metrics(&groups[key]));
    }

    let mut best: Option<K> = None;
    let mut worst: Option<K> = None;
    for key in &order {
        let wr = by_key[key].win_rate;
        let is_better = match &best {
            Some(b) => wr > by_key[b].win_rate,
            None => true,
        };
        if is_better {
            best = Some(key.clone());
        }
        let is_worse = match &worst {
            Some(w) => wr < by_key[w].win_rate,
            None => true,
        };
        if is_worse {
            worst = Some(key.clone());
        }
    }

    Segmentation { by_key, best, worst }
}

pub fn segment_by_regime(records: &[OutcomeRecord]) -> Segmentation<Trend> {
    segment_by(records, |r| r.regime)
}

pub fn segment_by_session(records: &[OutcomeRecord]) -> Segmentation<Session> {
    segment_by(records, |r| r.session)
}

/// Win-rate and profit-factor bucketed by `score` into bands of width 10
/// (50-59, 60-69, ...), using the same aggregation as regime/session.
pub fn segment_by_score_band(records: &[OutcomeRecord]) -> BTreeMap<u32, PeriodMetrics> {
    segment_by(records, |r| (r.score / 10.0).floor() as u32 * 10).by_key
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RulePerformance {
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_trades: usize,
}

/// Per `rule_id` appearing in any record's `rule_ids`, win_rate and total
/// pnl. A record voted on by multiple rules is counted once per rule.
pub fn rule_performance(records: &[OutcomeRecord]) -> BTreeMap<String, RulePerformance> {
    let mut per_rule: BTreeMap<String, Vec<&OutcomeRecord>> = BTreeMap::new();
    for r in records {
        for rule_id in &r.rule_ids {
            per_rule.entry(rule_id.clone()).or_default().push(r);
        }
    }
    per_rule
        .into_iter()
        .map(|(rule_id, rows)| {
            let total_trades = rows.len();
            let wins = rows.iter().filter(|r| r.outcome == WinLoss::Win).count();
            let win_rate = if total_trades > 0 { wins as f64 / total_trades as f64 * 100.0 } else { 0.0 };
            let total_pnl: f64 = rows.iter().map(|r| r.pnl).sum();
            (rule_id, RulePerformance { win_rate, total_pnl, total_trades })
        })
        .collect()
}

/// Admission test reused by the Auto-Tuner's loosened `OR` filter and by
/// ad-hoc direction filtering elsewhere: whether a record matches a
/// direction.
pub fn filter_direction(records: &[OutcomeRecord], direction: Direction) -> Vec<OutcomeRecord> {
    records.iter().filter(|r| r.direction == direction).cloned().collect()
}

/// One week's snapshot: overall metrics plus every segmentation, labeled
/// by an ISO `{year}-W{week}` string the caller supplies. The HTML
/// variant of this report belongs to the out-of-scope dashboard; this
/// crate only produces the JSON shape.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WeeklyReport {
    pub week_label: String,
    pub overall: PeriodMetrics,
    pub by_regime: Segmentation<Trend>,
    pub by_session: Segmentation<Session>,
    pub by_score_band: BTreeMap<u32, PeriodMetrics>,
    pub by_rule: BTreeMap<String, RulePerformance>,
}

pub fn weekly_report(records: &[OutcomeRecord], week_label: impl Into<String>) -> WeeklyReport {
    WeeklyReport {
        week_label: week_label.into(),
        overall: period_metrics(records),
        by_regime: segment_by_regime(records),
        by_session: segment_by_session(records),
        by_score_band: segment_by_score_band(records),
        by_rule: rule_performance(records),
    }
}

const WEEKLY_REPORT_HISTORY_CAP: usize = 52;

/// Rolling window of the last 52 weekly reports, oldest dropped first,
/// backing the `weekly_reports.json` artifact.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WeeklyReportHistory {
    pub reports: Vec<WeeklyReport>,
}

impl WeeklyReportHistory {
    pub fn push(&mut self, report: WeeklyReport) {
        self.reports.push(report);
        if self.reports.len() > WEEKLY_REPORT_HISTORY_CAP {
            let overflow = self.reports.len() - WEEKLY_REPORT_HISTORY_CAP;
            self.reports.drain(0..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(regime: Trend, session: Session, outcome: WinLoss, pnl: f64, score: f64) -> OutcomeRecord {
        OutcomeRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            price: 2000.0,
            rsi: 50.0,
            stoch_k: 50.0,
            adx: 20.0,
            atr_percentile: 50.0,
            regime,
            session,
            direction: Direction::Long,
            outcome,
            pnl,
            hold_minutes: 60,
            score,
            rule_ids: vec!["r1".into()],
        }
    }

    #[test]
    fn zero_losses_yields_zero_profit_factor() {
        let records = vec![record(Trend::Ranging, Session::London, WinLoss::Win, 10.0, 65.0)];
        let metrics = period_metrics(&records);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.win_rate, 100.0);
    }

    #[test]
    fn win_rate_and_profit_factor_over_mixed_outcomes() {
        let records = vec![
            record(Trend::Ranging, Session::London, WinLoss::Win, 20.0, 65.0),
            record(Trend::Ranging, Session::London, WinLoss::Loss, -10.0, 65.0),
        ];
        let metrics = period_metrics(&records);
        assert_eq!(metrics.win_rate, 50.0);
        assert_eq!(metrics.profit_factor, 2.0);
    }

    #[test]
    fn regime_segmentation_picks_best_and_worst_by_encounter_order_on_tie() {
        let records = vec![
            record(Trend::StrongUptrend, Session::London, WinLoss::Win, 10.0, 65.0),
            record(Trend::Ranging, Session::London, WinLoss::Win, 10.0, 65.0),
        ];
        let seg = segment_by_regime(&records);
        assert_eq!(seg.best, Some(Trend::StrongUptrend));
    }

    #[test]
    fn score_bands_group_by_width_ten() {
        let records = vec![
            record(Trend::Ranging, Session::London, WinLoss::Win, 10.0, 65.0),
            record(Trend::Ranging, Session::London, WinLoss::Win, 10.0, 69.0),
            record(Trend::Ranging, Session::London, WinLoss::Loss, -5.0, 72.0),
        ];
        let bands = segment_by_score_band(&records);
        assert_eq!(bands.get(&60).unwrap().total_signals, 2);
        assert_eq!(bands.get(&70).unwrap().total_signals, 1);
    }

    #[test]
    fn rule_performance_aggregates_per_rule_id() {
        let records = vec![
            record(Trend::Ranging, Session::London, WinLoss::Win, 10.0, 65.0),
            record(Trend::Ranging, Session::London, WinLoss::Loss, -5.0, 65.0),
        ];
        let perf = rule_performance(&records);
        let r1 = perf.get("r1").unwrap();
        assert_eq!(r1.total_trades, 2);
        assert_eq!(r1.win_rate, 50.0);
        assert_eq!(r1.total_pnl, 5.0);
    }
}
