//! Inbound data boundaries and the bar/indicator/correlation store.

pub mod csv_source;
pub mod json_tick_source;
pub mod provider;
pub mod store;

pub use csv_source::CsvBarSource;
pub use json_tick_source::JsonFileTickSource;
pub use provider::{BarSource, RawBar, Tick, TickSource};
pub use store::BarStore;
