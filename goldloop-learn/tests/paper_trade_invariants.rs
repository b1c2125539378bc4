//! Property-based coverage of `PaperTrade`'s core invariants: the
//! SL/TP/entry ordering enforced at open, and max_profit_during /
//! max_loss_during staying monotone (profit never decreases, loss
//! never improves) as ticks arrive.

use chrono::NaiveDate;
use proptest::prelude::*;

use goldloop_learn::domain::{Direction, PaperTrade, TradeStatus};

fn ts(minute: i64) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::minutes(minute)
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Long), Just(Direction::Short)]
}

proptest! {
    #[test]
    fn open_rejects_any_inverted_sl_tp_ordering(
        direction in arb_direction(),
        entry in 100.0..5000.0_f64,
        sl_offset in 1.0..200.0_f64,
        tp_offset in 1.0..200.0_f64,
    ) {
        // Deliberately invert: put the SL where the TP belongs and vice versa.
        let (sl, tp) = match direction {
            Direction::Long => (entry + sl_offset, entry - tp_offset),
            Direction::Short => (entry - sl_offset, entry + tp_offset),
        };
        let result = PaperTrade::open("sig", direction, entry, sl, tp, ts(0), 60.0, 0.0);
        prop_assert!(result.is_err());
    }

    #[test]
    fn open_accepts_correctly_ordered_levels_for_either_direction(
        direction in arb_direction(),
        entry in 100.0..5000.0_f64,
        sl_offset in 1.0..200.0_f64,
        tp_offset in 1.0..200.0_f64,
    ) {
        let (sl, tp) = match direction {
            Direction::Long => (entry - sl_offset, entry + tp_offset),
            Direction::Short => (entry + sl_offset, entry - tp_offset),
        };
        let result = PaperTrade::open("sig", direction, entry, sl, tp, ts(0), 60.0, 0.0);
        prop_assert!(result.is_ok());
    }

    /// Feed a sequence of ticks and check max_profit_during/max_loss_during
    /// are monotone: profit never decreases, loss never improves, and both
    /// stay on the correct side of zero (>=0 / <=0 respectively).
    #[test]
    fn max_profit_and_max_loss_are_monotone_across_ticks(
        entry in 1000.0..3000.0_f64,
        deltas in prop::collection::vec(-50.0..50.0_f64, 1..30),
    ) {
        let sl = entry - 500.0;
        let tp = entry + 500.0;
        let mut trade = PaperTrade::open("sig", Direction::Long, entry, sl, tp, ts(0), 60.0, 0.0).unwrap();

        let mut last_profit = trade.max_profit_during;
        let mut last_loss = trade.max_loss_during;
        prop_assert!(last_profit >= 0.0);
        prop_assert!(last_loss <= 0.0);

        let mut price = entry;
        for (i, delta) in deltas.iter().enumerate() {
            price += delta;
            if trade.status != TradeStatus::Open {
                break;
            }
            trade.check_tick(price, ts((i as i64 + 1) * 5), 100_000);

            prop_assert!(trade.max_profit_during >= last_profit - 1e-9);
            prop_assert!(trade.max_loss_during <= last_loss + 1e-9);
            prop_assert!(trade.max_profit_during >= 0.0);
            prop_assert!(trade.max_loss_during <= 0.0);

            last_profit = trade.max_profit_during;
            last_loss = trade.max_loss_during;
        }
    }
}
