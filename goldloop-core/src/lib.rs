//! Goldloop Core — domain types, indicator engine, and the regime, sentiment,
//! pattern, and signal-scoring pipeline shared by the learning runner and CLI.
//!
//! This crate owns:
//! - Domain types (bars, regimes, setups, sentiment, patterns, signals, tuning config)
//! - The `Indicator` trait and its concrete implementations, precomputed once
//!   over a bar history and shared read-only across the pipeline
//! - Regime/sentiment/pattern classification and signal scoring
//! - The bar/indicator/correlation store (rusqlite) and the inbound `BarSource`/`TickSource` traits
//! - Deterministic ID generation and the seeded RNG hierarchy used by the learning runner

pub mod components;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod pattern_match;
pub mod pipeline;
pub mod regime_classify;
pub mod rng;
pub mod scoring;
pub mod sentiment_analyze;
