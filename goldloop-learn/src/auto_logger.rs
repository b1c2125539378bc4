//! Auto-Logger — polls an external tick source, admits new paper trades,
//! and closes them against fixed-dollar SL/TP/expiry.
//!
//! Single-writer state machine: one in-memory working set of open trades,
//! advanced one tick at a time. The real-time network poller is out of
//! scope; callers drive `on_tick` from whatever `TickSource` they have.

use serde::{Deserialize, Serialize};

use goldloop_core::data::Tick;

use crate::domain::{Direction, PaperTrade, TradeStatus};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoLoggerConfig {
    pub check_interval_seconds: u64,
    pub min_score: f64,
    pub stop_loss_points: f64,
    pub take_profit_points: f64,
    pub signal_expiry_minutes: i64,
}

impl Default for AutoLoggerConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 10,
            min_score: 60.0,
            stop_loss_points: 10.0,
            take_profit_points: 15.0,
            signal_expiry_minutes: 240,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub total_pnl: f64,
}

pub struct AutoLogger {
    config: AutoLoggerConfig,
    open_trades: Vec<PaperTrade>,
    closed_trades: Vec<PaperTrade>,
    last_signal_hash: Option<u64>,
    next_id: u64,
}

impl AutoLogger {
    pub fn new(config: AutoLoggerConfig) -> Self {
        Self { config, open_trades: Vec::new(), closed_trades: Vec::new(), last_signal_hash: None, next_id: 0 }
    }

    /// Recover in-flight state from a restart: re-adopt every OPEN-status
    /// trade into the working set before the first poll — a restart must
    /// not silently drop trades that were open when the process last
    /// exited.
    pub fn recover_open_trades(&mut self, trades: Vec<PaperTrade>) {
        self.open_trades = trades.into_iter().filter(|t| t.status == TradeStatus::Open).collect();
    }

    pub fn open_trades(&self) -> &[PaperTrade] {
        &self.open_trades
    }

    pub fn closed_trades(&self) -> &[PaperTrade] {
        &self.closed_trades
    }

    fn next_signal_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        format!("auto_{id}")
    }

    /// De-duplicate by `hash(price, score_long, score_short)`; returns
    /// `false` (no-op) if this tick is identical to the last one seen.
    fn is_new_tick(&mut self, tick: &Tick) -> bool {
        let (Some(price), Some(long), Some(short)) = (tick.price, tick.score_long, tick.score_short) else {
            return false;
        };
        let hash = tick_hash(price, long, short);
        if self.last_signal_hash == Some(hash) {
            return false;
        }
        self.last_signal_hash = Some(hash);
        true
    }

    /// Process one polled tick: skip on missing price (a no-op, not a
    /// closure) or a duplicate signal; otherwise check every open trade's
    /// outcome (target before stop before expiry) then, if admitted,
    /// open a new trade.
    pub fn on_tick(&mut self, tick: &Tick, now: chrono::NaiveDateTime) -> Result<()> {
        let Some(price) = tick.price else { return Ok(()) };

        for trade in &mut self.open_trades {
            trade.check_tick(price, now, self.config.signal_expiry_minutes);
        }
        let (still_open, newly_closed): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.open_trades).into_iter().partition(|t| t.status == TradeStatus::Open);
        self.open_trades = still_open;
        self.closed_trades.extend(newly_closed);

        if !self.is_new_tick(tick) {
            return Ok(());
        }

        let (Some(score_long), Some(score_short)) = (tick.score_long, tick.score_short) else { return Ok(()) };
        if score_long.max(score_short) < self.config.min_score {
            return Ok(());
        }
        // An exact tie admits neither direction: the separate
        // `score_long > score_short` / `score_short > score_long` checks
        // never both fire on equality.
        let direction = if score_long > score_short {
            Some(Direction::Long)
        } else if score_short > score_long {
            Some(Direction::Short)
        } else {
            None
        };
        let Some(direction) = direction else { return Ok(()) };

        let (sl, tp) = match direction {
            Direction::Long => (price - self.config.stop_loss_points, price + self.config.take_profit_points),
            Direction::Short => (price + self.config.stop_loss_points, price - self.config.take_profit_points),
        };

        let id = self.next_signal_id();
        let mut trade = PaperTrade::open(id, direction, price, sl, tp, now, score_long, score_short)?;
        trade.regime = tick.trend.map(|t| format!("{t:?}"));
        trade.session = tick.session;
        trade.rsi = tick.rsi;
        trade.stoch = tick.stoch;
        trade.atr = tick.atr;
        self.open_trades.push(trade);
        Ok(())
    }

    /// Statistics derived by scanning the persisted closed set.
    pub fn stats(&self) -> LoggerStats {
        stats_over(&self.closed_trades)
    }
}

fn tick_hash(price: f64, score_long: f64, score_short: f64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&price.to_bits().to_le_bytes());
    hasher.update(&score_long.to_bits().to_le_bytes());
    hasher.update(&score_short.to_bits().to_le_bytes());
    u64::from_le_bytes(hasher.finalize().as_bytes()[..8].try_into().unwrap())
}

pub fn stats_over(trades: &[PaperTrade]) -> LoggerStats {
    let total = trades.len();
    let wins: Vec<f64> = trades.iter().filter(|t| t.status == TradeStatus::Win).filter_map(|t| t.pnl).collect();
    let losses: Vec<f64> = trades.iter().filter(|t| t.status == TradeStatus::Loss).filter_map(|t| t.pnl).collect();

    let win_count = wins.len();
    let loss_count = losses.len();
    let win_rate = if total > 0 { win_count as f64 / total as f64 * 100.0 } else { 0.0 };
    let gross_win: f64 = wins.iter().sum();
    let gross_loss: f64 = losses.iter().map(|p| p.abs()).sum();
    let profit_factor = if gross_loss > 0.0 { gross_win / gross_loss } else { 0.0 };
    let avg_win = if win_count > 0 { gross_win / win_count as f64 } else { 0.0 };
    let avg_loss = if loss_count > 0 { -gross_loss / loss_count as f64 } else { 0.0 };
    let total_pnl: f64 = trades.iter().filter_map(|t| t.pnl).sum();

    LoggerStats { total, wins: win_count, losses: loss_count, win_rate, profit_factor, avg_win, avg_loss, total_pnl }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn tick(price: f64, long: f64, short: f64) -> Tick {
        Tick { price: Some(price), score_long: Some(long), score_short: Some(short), ..Default::default() }
    }

    #[test]
    fn admits_long_when_score_long_wins_above_threshold() {
        let mut logger = AutoLogger::new(AutoLoggerConfig::default());
        logger.on_tick(&tick(2000.0, 65.0, 10.0), ts(0)).unwrap();
        assert_eq!(logger.open_trades().len(), 1);
        assert_eq!(logger.open_trades()[0].direction, Direction::Long);
    }

    #[test]
    fn exact_tie_admits_neither_direction() {
        let mut logger = AutoLogger::new(AutoLoggerConfig::default());
        logger.on_tick(&tick(2000.0, 65.0, 65.0), ts(0)).unwrap();
        assert!(logger.open_trades().is_empty());
    }

    #[test]
    fn below_min_score_does_not_admit() {
        let mut logger = AutoLogger::new(AutoLoggerConfig::default());
        logger.on_tick(&tick(2000.0, 40.0, 10.0), ts(0)).unwrap();
        assert!(logger.open_trades().is_empty());
    }

    #[test]
    fn duplicate_tick_is_a_no_op() {
        let mut logger = AutoLogger::new(AutoLoggerConfig::default());
        logger.on_tick(&tick(2000.0, 65.0, 10.0), ts(0)).unwrap();
        logger.on_tick(&tick(2000.0, 65.0, 10.0), ts(1)).unwrap();
        assert_eq!(logger.open_trades().len(), 1);
    }

    #[test]
    fn missing_price_is_a_no_op_not_a_closure() {
        let mut logger = AutoLogger::new(AutoLoggerConfig::default());
        logger.on_tick(&Tick::default(), ts(0)).unwrap();
        assert!(logger.open_trades().is_empty());
        assert!(logger.closed_trades().is_empty());
    }

    #[test]
    fn closed_trade_moves_to_closed_set_and_feeds_stats() {
        let mut logger = AutoLogger::new(AutoLoggerConfig::default());
        logger.on_tick(&tick(2000.0, 65.0, 10.0), ts(0)).unwrap();
        // TP is entry + take_profit_points (15.0 default) -> 2015.
        logger.on_tick(&tick(2020.0, 10.0, 10.0), ts(1)).unwrap();
        assert!(logger.open_trades().is_empty());
        assert_eq!(logger.closed_trades().len(), 1);
        let stats = logger.stats();
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.win_rate, 100.0);
    }

    #[test]
    fn recovers_open_trades_on_restart() {
        let mut logger = AutoLogger::new(AutoLoggerConfig::default());
        let trade = PaperTrade::open("sig1", Direction::Long, 2000.0, 1990.0, 2010.0, ts(0), 60.0, 0.0).unwrap();
        logger.recover_open_trades(vec![trade]);
        assert_eq!(logger.open_trades().len(), 1);
    }
}
