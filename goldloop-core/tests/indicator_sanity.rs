//! Integration coverage for the full indicator set as wired together by
//! the analysis pipeline: every indicator the pipeline computes must
//! warm up to a finite value given enough history, and a truncated
//! prefix of the same series must reproduce the full series exactly
//! over the overlapping range (no look-ahead leaking in through the
//! pipeline's own wiring, as opposed to each indicator in isolation).

use chrono::NaiveDate;

use goldloop_core::domain::Bar;
use goldloop_core::pipeline::compute_indicators;

fn synthetic_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut price = 1900.0_f64;
    (0..n)
        .map(|i| {
            price += ((i as f64) * 0.2).sin() * 4.0 + 0.3;
            let open = price - 1.0;
            let close = price;
            Bar {
                symbol: "XAUUSD".into(),
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.5,
                low: open.min(close) - 1.5,
                close,
                volume: 10_000 + (i as u64 % 500),
            }
        })
        .collect()
}

#[test]
fn every_wired_indicator_warms_up_to_a_finite_value() {
    let bars = synthetic_bars(120);
    let values = compute_indicators(&bars);
    let last = bars.len() - 1;
    for name in ["ema_9", "ema_21", "ema_50", "adx_14", "atr_14", "stoch_k", "rsi_14"] {
        let v = values.get(name, last).unwrap_or_else(|| panic!("missing indicator {name}"));
        assert!(v.is_finite(), "{name} has not warmed up by bar {last}: {v}");
    }
}

#[test]
fn pipeline_wiring_introduces_no_lookahead_contamination() {
    let full_bars = synthetic_bars(150);
    let truncated_bars: Vec<Bar> = full_bars[..100].to_vec();

    let full_values = compute_indicators(&full_bars);
    let truncated_values = compute_indicators(&truncated_bars);

    for name in ["ema_9", "ema_21", "ema_50", "adx_14", "atr_14", "stoch_k", "rsi_14"] {
        for i in 0..100 {
            let full_v = full_values.get(name, i).unwrap();
            let trunc_v = truncated_values.get(name, i).unwrap();
            if full_v.is_nan() {
                assert!(trunc_v.is_nan(), "{name} at bar {i}: full is NaN but truncated is {trunc_v}");
            } else {
                assert!(
                    (full_v - trunc_v).abs() < 1e-9,
                    "{name} at bar {i}: full={full_v} truncated={trunc_v}"
                );
            }
        }
    }
}
