//! Auto-Logger persistence (rusqlite, bundled SQLite).
//!
//! Two tables: `signals`, one row per `PaperTrade` keyed by `signal_id`,
//! and `price_history`, an append-only tick log. Matches the bar/indicator
//! store's single-writer posture (`PRAGMA journal_mode=WAL`) since the
//! monitor loop and an operator's read-only inspection may run concurrently.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use goldloop_core::domain::Session;

use crate::domain::{Direction, PaperTrade, TradeStatus};
use crate::error::Result;

pub struct AutoLoggerStore {
    conn: Connection,
}

impl AutoLoggerStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS signals (
                signal_id TEXT PRIMARY KEY,
                open_ts TEXT NOT NULL,
                direction TEXT NOT NULL,
                entry REAL NOT NULL,
                sl REAL NOT NULL,
                tp REAL NOT NULL,
                score_long REAL NOT NULL,
                score_short REAL NOT NULL,
                regime TEXT,
                session TEXT,
                rsi REAL,
                stoch REAL,
                atr REAL,
                status TEXT NOT NULL,
                exit_price REAL,
                exit_ts TEXT,
                pnl REAL,
                max_profit_during REAL NOT NULL,
                max_loss_during REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS price_history (
                ts TEXT NOT NULL,
                price REAL NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Insert-or-replace a trade's full row, keyed by `signal_id` — an
    /// open trade re-upserted after a later tick overwrites its prior row.
    pub fn upsert_trade(&self, trade: &PaperTrade) -> Result<()> {
        self.conn.execute(
            "INSERT INTO signals (
                signal_id, open_ts, direction, entry, sl, tp, score_long, score_short,
                regime, session, rsi, stoch, atr, status, exit_price, exit_ts, pnl,
                max_profit_during, max_loss_during
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)
            ON CONFLICT(signal_id) DO UPDATE SET
                status = excluded.status,
                exit_price = excluded.exit_price,
                exit_ts = excluded.exit_ts,
                pnl = excluded.pnl,
                max_profit_during = excluded.max_profit_during,
                max_loss_during = excluded.max_loss_during",
            params![
                trade.signal_id,
                fmt_ts(trade.open_ts),
                direction_str(trade.direction),
                trade.entry,
                trade.sl,
                trade.tp,
                trade.score_long,
                trade.score_short,
                trade.regime,
                trade.session.map(session_str),
                trade.rsi,
                trade.stoch,
                trade.atr,
                status_str(trade.status),
                trade.exit_price,
                trade.exit_ts.map(fmt_ts),
                trade.pnl,
                trade.max_profit_during,
                trade.max_loss_during,
            ],
        )?;
        Ok(())
    }

    /// Load every row with `status = 'OPEN'`, for `AutoLogger::recover_open_trades`.
    pub fn load_open_trades(&self) -> Result<Vec<PaperTrade>> {
        self.load_where("status = 'OPEN'")
    }

    pub fn load_all_trades(&self) -> Result<Vec<PaperTrade>> {
        self.load_where("1=1")
    }

    fn load_where(&self, predicate: &str) -> Result<Vec<PaperTrade>> {
        let sql = format!(
            "SELECT signal_id, open_ts, direction, entry, sl, tp, score_long, score_short,
                    regime, session, rsi, stoch, atr, status, exit_price, exit_ts, pnl,
                    max_profit_during, max_loss_during
             FROM signals WHERE {predicate} ORDER BY open_ts"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let direction: String = row.get(2)?;
                let session: Option<String> = row.get(9)?;
                let status: String = row.get(13)?;
                let open_ts: String = row.get(1)?;
                let exit_ts: Option<String> = row.get(15)?;
                Ok(PaperTrade {
                    signal_id: row.get(0)?,
                    direction: parse_direction(&direction),
                    entry: row.get(3)?,
                    sl: row.get(4)?,
                    tp: row.get(5)?,
                    open_ts: parse_ts(&open_ts).unwrap_or_else(epoch),
                    status: parse_status(&status),
                    score_long: row.get(6)?,
                    score_short: row.get(7)?,
                    regime: row.get(8)?,
                    session: session.as_deref().and_then(parse_session),
                    rsi: row.get(10)?,
                    stoch: row.get(11)?,
                    atr: row.get(12)?,
                    exit_price: row.get(14)?,
                    exit_ts: exit_ts.and_then(|s| parse_ts(&s)),
                    pnl: row.get(16)?,
                    max_profit_during: row.get(17)?,
                    max_loss_during: row.get(18)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn record_price(&self, ts: NaiveDateTime, price: f64) -> Result<()> {
        self.conn.execute("INSERT INTO price_history (ts, price) VALUES (?1, ?2)", params![fmt_ts(ts), price])?;
        Ok(())
    }

    pub fn price_history_len(&self) -> Result<usize> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM price_history", [], |row| row.get(0)).optional()?.unwrap_or(0);
        Ok(n as usize)
    }
}

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Explicit format string on both sides of the round trip — `NaiveDateTime`'s
/// `Display` and `FromStr` are not guaranteed to agree on layout.
fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).ok()
}

fn direction_str(d: Direction) -> &'static str {
    match d {
        Direction::Long => "LONG",
        Direction::Short => "SHORT",
    }
}

fn parse_direction(s: &str) -> Direction {
    if s == "SHORT" {
        Direction::Short
    } else {
        Direction::Long
    }
}

fn status_str(s: TradeStatus) -> &'static str {
    match s {
        TradeStatus::Open => "OPEN",
        TradeStatus::Win => "WIN",
        TradeStatus::Loss => "LOSS",
        TradeStatus::Expired => "EXPIRED",
    }
}

fn parse_status(s: &str) -> TradeStatus {
    match s {
        "WIN" => TradeStatus::Win,
        "LOSS" => TradeStatus::Loss,
        "EXPIRED" => TradeStatus::Expired,
        _ => TradeStatus::Open,
    }
}

fn epoch() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn session_str(s: Session) -> String {
    format!("{s:?}")
}

fn parse_session(s: &str) -> Option<Session> {
    match s {
        "Asia" => Some(Session::Asia),
        "London" => Some(Session::London),
        "Overlap" => Some(Session::Overlap),
        "NewYork" | "Newyork" => Some(Session::Newyork),
        _ => None,
    }
}
