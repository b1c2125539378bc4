//! Inbound data boundaries: `BarSource` and `TickSource`.
//!
//! Both traits model a permissive "missing data is not an error" contract —
//! the real network fetchers are out of scope; file-backed implementations
//! live alongside these traits for tests and CLI parity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Session, Trend};

/// A single OHLCV bar as returned by a bar source, tz-naive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Fetches historical daily bars for a symbol over a date range.
///
/// Missing data (unknown symbol, gap in history, provider outage) yields an
/// empty `Vec`, never an error — callers treat an empty result the same way
/// they treat an insufficient warm-up window.
pub trait BarSource: Send + Sync {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar>;
}

/// A single streamed tick used by the monitor loop.
///
/// Only `price` is mandatory; every other field is optional context the
/// producer may or may not have computed. Absence of `price` means "no
/// update" rather than "zero price".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tick {
    pub price: Option<f64>,
    pub score_long: Option<f64>,
    pub score_short: Option<f64>,
    pub trend: Option<Trend>,
    pub session: Option<Session>,
    pub rsi: Option<f64>,
    pub stoch: Option<f64>,
    pub atr: Option<f64>,
}

/// Polls for the latest tick. Implementations are file/stdin-backed; a
/// real-time network poller is out of scope.
pub trait TickSource: Send + Sync {
    fn poll(&self) -> Option<Tick>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticTickSource(Option<Tick>);
    impl TickSource for StaticTickSource {
        fn poll(&self) -> Option<Tick> {
            self.0.clone()
        }
    }

    #[test]
    fn missing_price_reads_as_no_update() {
        let source = StaticTickSource(Some(Tick { price: None, ..Default::default() }));
        let tick = source.poll().unwrap();
        assert!(tick.price.is_none());
    }

    struct EmptyBarSource;
    impl BarSource for EmptyBarSource {
        fn fetch(&self, _symbol: &str, _start: NaiveDate, _end: NaiveDate) -> Vec<RawBar> {
            Vec::new()
        }
    }

    #[test]
    fn missing_symbol_yields_empty_not_error() {
        let source = EmptyBarSource;
        let bars = source.fetch(
            "NOPE",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        assert!(bars.is_empty());
    }
}
