//! Relational bar/indicator/correlation store (rusqlite, bundled SQLite).
//!
//! Four tables: `bars` unique on `(symbol, date)`, `indicators` unique on
//! `(symbol, date, name)`, `correlations` keyed by `(base, other, start, end,
//! window)`, and `metadata` as a generic key/value side-table.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{GoldloopError, Result};

pub struct BarStore {
    conn: Connection,
}

impl BarStore {
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
            CREATE TABLE IF NOT EXISTS bars (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                o REAL NOT NULL,
                h REAL NOT NULL,
                l REAL NOT NULL,
                c REAL NOT NULL,
                v INTEGER NOT NULL,
                UNIQUE(symbol, date)
            );
            CREATE TABLE IF NOT EXISTS indicators (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                name TEXT NOT NULL,
                value REAL NOT NULL,
                UNIQUE(symbol, date, name)
            );
            CREATE TABLE IF NOT EXISTS correlations (
                base TEXT NOT NULL,
                other TEXT NOT NULL,
                start TEXT NOT NULL,
                end TEXT NOT NULL,
                value REAL NOT NULL,
                window INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Upsert a batch of bars for one symbol. Existing `(symbol, date)` rows
    /// are overwritten, matching a re-fetch of a previously downloaded range.
    pub fn upsert_bars(&mut self, symbol: &str, bars: &[crate::data::provider::RawBar]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for bar in bars {
            tx.execute(
                "INSERT INTO bars (symbol, date, o, h, l, c, v) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(symbol, date) DO UPDATE SET o=excluded.o, h=excluded.h, l=excluded.l, c=excluded.c, v=excluded.v",
                params![symbol, bar.timestamp.to_string(), bar.open, bar.high, bar.low, bar.close, bar.volume as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<crate::domain::Bar>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, o, h, l, c, v FROM bars WHERE symbol = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(
            params![symbol, start.to_string(), end.to_string()],
            |row| {
                let date_str: String = row.get(0)?;
                Ok(crate::domain::Bar {
                    symbol: symbol.to_string(),
                    date: date_str.parse().unwrap_or(start),
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get::<_, i64>(5)? as u64,
                })
            },
        )?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(GoldloopError::from)
    }

    pub fn upsert_indicator(&mut self, symbol: &str, date: NaiveDate, name: &str, value: f64) -> Result<()> {
        if value.is_nan() {
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO indicators (symbol, date, name, value) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(symbol, date, name) DO UPDATE SET value=excluded.value",
            params![symbol, date.to_string(), name, value],
        )?;
        Ok(())
    }

    pub fn load_indicator(&self, symbol: &str, date: NaiveDate, name: &str) -> Result<Option<f64>> {
        self.conn
            .query_row(
                "SELECT value FROM indicators WHERE symbol = ?1 AND date = ?2 AND name = ?3",
                params![symbol, date.to_string(), name],
                |row| row.get(0),
            )
            .optional()
            .map_err(GoldloopError::from)
    }

    pub fn upsert_correlation(&mut self, base: &str, other: &str, start: NaiveDate, end: NaiveDate, value: f64, window: u32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO correlations (base, other, start, end, value, window) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![base, other, start.to_string(), end.to_string(), value, window],
        )?;
        Ok(())
    }

    pub fn set_metadata(&mut self, key: &str, value: &serde_json::Value, updated_at: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO metadata (key, value_json, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value_json=excluded.value_json, updated_at=excluded.updated_at",
            params![key, value.to_string(), updated_at],
        )?;
        Ok(())
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value_json FROM metadata WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }
}
