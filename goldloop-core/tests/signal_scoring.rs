//! End-to-end coverage of the analysis pipeline's signal-scoring stage:
//! feed a full bar history through `analyze_latest` and check the
//! resulting `Signal` obeys the SL/TP/entry ordering invariant and the
//! rr_ratio identity, not just that a signal was produced.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use goldloop_core::domain::{Bar, SignalType, TuningConfig};
use goldloop_core::pipeline::analyze_latest;

fn trending_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 1900.0 + (i as f64) * 2.5;
            let open = close - 1.0;
            Bar {
                symbol: "XAUUSD".into(),
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.5,
                low: open.min(close) - 1.5,
                close,
                volume: 10_000,
            }
        })
        .collect()
}

#[test]
fn scored_signal_respects_sl_tp_ordering_and_rr_ratio() {
    let bars = trending_bars(120);
    let snapshot =
        analyze_latest(&bars, &BTreeMap::new(), &TuningConfig::default()).expect("120 trending bars should warm up");
    let signal = snapshot.signal;

    match signal.signal_type {
        SignalType::Long => {
            assert!(signal.stop_loss < signal.entry_price, "LONG: sl must be below entry");
            assert!(signal.entry_price < signal.take_profit, "LONG: entry must be below tp");
        }
        SignalType::Short => {
            assert!(signal.take_profit < signal.entry_price, "SHORT: tp must be below entry");
            assert!(signal.entry_price < signal.stop_loss, "SHORT: entry must be below sl");
        }
        SignalType::None => {
            assert_eq!(signal.stop_loss, 0.0);
            assert_eq!(signal.take_profit, 0.0);
            return;
        }
    }

    let config = TuningConfig::default();
    let expected_rr = config.atr_tp_mult / config.atr_stop_mult;
    assert!(
        (signal.rr_ratio - expected_rr).abs() < 1e-6,
        "rr_ratio {} should track atr_tp_mult/atr_stop_mult {}",
        signal.rr_ratio,
        expected_rr
    );
}

#[test]
fn regime_and_pattern_context_are_populated_alongside_the_signal() {
    let bars = trending_bars(120);
    let snapshot =
        analyze_latest(&bars, &BTreeMap::new(), &TuningConfig::default()).expect("120 trending bars should warm up");

    assert!(!snapshot.regime_history.is_empty());
    assert!((0.0..=1.0).contains(&snapshot.pattern.confidence));
    assert_eq!(snapshot.signal.regime_label, snapshot.regime_history.last().unwrap().trend);
}
