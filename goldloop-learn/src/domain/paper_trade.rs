//! `PaperTrade` — a simulated position opened by the auto-logger and closed
//! by SL/TP/expiry.

use crate::domain::Direction;
use crate::error::{LearnError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Open,
    Win,
    Loss,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperTrade {
    pub signal_id: String,
    pub direction: Direction,
    pub entry: f64,
    pub sl: f64,
    pub tp: f64,
    pub open_ts: chrono::NaiveDateTime,
    pub status: TradeStatus,
    pub score_long: f64,
    pub score_short: f64,
    pub regime: Option<String>,
    pub session: Option<goldloop_core::domain::Session>,
    pub rsi: Option<f64>,
    pub stoch: Option<f64>,
    pub atr: Option<f64>,
    pub exit_price: Option<f64>,
    pub exit_ts: Option<chrono::NaiveDateTime>,
    pub pnl: Option<f64>,
    pub max_profit_during: f64,
    pub max_loss_during: f64,
}

impl PaperTrade {
    /// Open a new trade, validating the SL/TP/entry invariant: for LONG,
    /// `sl < entry < tp`; for SHORT, `tp < entry < sl`. A violation is a
    /// class-3 invariant error, rejected before any trade is created.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        signal_id: impl Into<String>,
        direction: Direction,
        entry: f64,
        sl: f64,
        tp: f64,
        open_ts: chrono::NaiveDateTime,
        score_long: f64,
        score_short: f64,
    ) -> Result<Self> {
        let valid = match direction {
            Direction::Long => sl < entry && entry < tp,
            Direction::Short => tp < entry && entry < sl,
        };
        if !valid {
            return Err(LearnError::InvariantViolation(format!(
                "paper trade SL/TP/entry out of order: direction={direction:?} entry={entry} sl={sl} tp={tp}"
            )));
        }
        Ok(Self {
            signal_id: signal_id.into(),
            direction,
            entry,
            sl,
            tp,
            open_ts,
            status: TradeStatus::Open,
            score_long,
            score_short,
            regime: None,
            session: None,
            rsi: None,
            stoch: None,
            atr: None,
            exit_price: None,
            exit_ts: None,
            pnl: None,
            max_profit_during: 0.0,
            max_loss_during: 0.0,
        })
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Long => price - self.entry,
            Direction::Short => self.entry - price,
        }
    }

    /// Update `max_profit_during`/`max_loss_during` monotonically from an
    /// observed unrealized PnL at the current tick.
    pub fn observe(&mut self, price: f64) {
        let pnl = self.unrealized_pnl(price);
        if pnl > self.max_profit_during {
            self.max_profit_during = pnl;
        }
        if pnl < self.max_loss_during {
            self.max_loss_during = pnl;
        }
    }

    fn close(&mut self, status: TradeStatus, price: f64, ts: chrono::NaiveDateTime) {
        self.status = status;
        self.exit_price = Some(price);
        self.exit_ts = Some(ts);
        self.pnl = Some(self.unrealized_pnl(price));
    }

    /// One per-tick outcome check, evaluated in this exact order: target
    /// before stop before expiry. A bar that straddles both TP and SL is
    /// biased toward WIN by this ordering — preserved deliberately, not a
    /// bug.
    pub fn check_tick(&mut self, price: f64, now: chrono::NaiveDateTime, expiry_minutes: i64) {
        if self.status != TradeStatus::Open {
            return;
        }
        self.observe(price);

        let hit_tp = match self.direction {
            Direction::Long => price >= self.tp,
            Direction::Short => price <= self.tp,
        };
        let hit_sl = match self.direction {
            Direction::Long => price <= self.sl,
            Direction::Short => price >= self.sl,
        };

        if hit_tp {
            self.close(TradeStatus::Win, price, now);
            return;
        }
        if hit_sl {
            self.close(TradeStatus::Loss, price, now);
            return;
        }
        if (now - self.open_ts).num_minutes() > expiry_minutes {
            self.close(TradeStatus::Expired, price, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_long_levels() {
        let result = PaperTrade::open("sig1", Direction::Long, 2000.0, 2010.0, 1990.0, ts(0), 60.0, 0.0);
        assert!(result.is_err());
    }

    /// Open LONG at 2000, SL=1996, TP=2008. Ticks {2003, 2006, 2009, 2005}
    /// -> WIN at tick 3, exit=2009, pnl=9, max_profit_during=9,
    /// max_loss_during>=0.
    #[test]
    fn scenario_four_tp_hit_on_third_tick() {
        let mut trade = PaperTrade::open("sig1", Direction::Long, 2000.0, 1996.0, 2008.0, ts(0), 60.0, 0.0).unwrap();
        for (i, price) in [2003.0, 2006.0, 2009.0, 2005.0].into_iter().enumerate() {
            trade.check_tick(price, ts(i as u32 + 1), 1440);
        }
        assert_eq!(trade.status, TradeStatus::Win);
        assert_eq!(trade.exit_price, Some(2009.0));
        assert_eq!(trade.pnl, Some(9.0));
        assert_eq!(trade.max_profit_during, 9.0);
        assert!(trade.max_loss_during >= 0.0);
    }

    #[test]
    fn straddling_tick_is_biased_toward_win() {
        // price jumps past both TP and SL within a single tick.
        let mut trade = PaperTrade::open("sig1", Direction::Long, 2000.0, 1990.0, 2010.0, ts(0), 60.0, 0.0).unwrap();
        trade.check_tick(2500.0, ts(1), 1440); // blows through both levels
        assert_eq!(trade.status, TradeStatus::Win);
    }

    #[test]
    fn expires_after_window_with_no_tp_or_sl_hit() {
        let mut trade = PaperTrade::open("sig1", Direction::Long, 2000.0, 1990.0, 2010.0, ts(0), 60.0, 0.0).unwrap();
        trade.check_tick(2001.0, ts(0) + chrono::Duration::minutes(2000), 1440);
        assert_eq!(trade.status, TradeStatus::Expired);
    }

    #[test]
    fn closed_trade_ignores_further_ticks() {
        let mut trade = PaperTrade::open("sig1", Direction::Long, 2000.0, 1990.0, 2010.0, ts(0), 60.0, 0.0).unwrap();
        trade.check_tick(2010.0, ts(1), 1440);
        assert_eq!(trade.status, TradeStatus::Win);
        let exit_before = trade.exit_price;
        trade.check_tick(1990.0, ts(2), 1440);
        assert_eq!(trade.exit_price, exit_before);
    }
}
