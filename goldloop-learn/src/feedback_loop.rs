//! Feedback Loop — consumes completed outcomes and monitors for
//! degradation, triggering re-optimization. A scheduling/triggering
//! wrapper around the Performance Analyzer's period-metrics computation,
//! not a second implementation of it.

use chrono::NaiveDateTime;

use crate::domain::OutcomeRecord;
use crate::performance::{self, PeriodMetrics};

const DEGRADATION_PP: f64 = 10.0;
const MIN_PROFIT_FACTOR: f64 = 1.2;
const MIN_WIN_RATE: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct TriggerRecord {
    pub observed_at: NaiveDateTime,
    pub fired: bool,
    pub reasons: Vec<String>,
    pub recent_7d: PeriodMetrics,
    pub historical_30d: PeriodMetrics,
}

fn in_last_n_days(records: &[OutcomeRecord], now: NaiveDateTime, days: i64) -> Vec<OutcomeRecord> {
    let cutoff = now - chrono::Duration::days(days);
    records.iter().filter(|r| r.timestamp > cutoff && r.timestamp <= now).cloned().collect()
}

/// Compute the 7-day and 30-day metrics and decide whether re-optimization
/// should fire, persisting the reasons alongside the verdict so a caller
/// can audit why a trigger fired (or didn't).
pub fn evaluate(history: &[OutcomeRecord], now: NaiveDateTime) -> TriggerRecord {
    let recent = in_last_n_days(history, now, 7);
    let historical = in_last_n_days(history, now, 30);
    let recent_7d = performance::period_metrics(&recent);
    let historical_30d = performance::period_metrics(&historical);

    let mut reasons = Vec::new();
    if recent_7d.win_rate < historical_30d.win_rate - DEGRADATION_PP {
        reasons.push(format!(
            "7-day win rate {:.1}% degraded more than {DEGRADATION_PP}pp below 30-day win rate {:.1}%",
            recent_7d.win_rate, historical_30d.win_rate
        ));
    }
    if recent_7d.profit_factor < MIN_PROFIT_FACTOR {
        reasons.push(format!("7-day profit factor {:.2} below floor {MIN_PROFIT_FACTOR}", recent_7d.profit_factor));
    }
    if recent_7d.win_rate < MIN_WIN_RATE {
        reasons.push(format!("7-day win rate {:.1}% below floor {MIN_WIN_RATE}%", recent_7d.win_rate));
    }

    let fired = !reasons.is_empty();
    if fired {
        tracing::warn!(?reasons, "feedback loop: re-optimization trigger fired");
    }

    TriggerRecord { observed_at: now, fired, reasons, recent_7d, historical_30d }
}
