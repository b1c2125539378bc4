//! Resolved runtime configuration.
//!
//! Precedence is CLI flag > config file > built-in default, applied in
//! `resolve()`. The config file is optional TOML; any field it omits falls
//! back to `RunConfig::default()`. Content-hashed via BLAKE3 over the
//! serialized struct — two runs with an identical resolved configuration
//! share the same id.

use std::path::Path;

use serde::{Deserialize, Serialize};

use goldloop_core::domain::TuningConfig;
use goldloop_learn::auto_logger::AutoLoggerConfig;
use goldloop_learn::strategy_factory::FactoryConfig;

/// Content-addressable id for a resolved configuration.
pub type ConfigId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Directory of per-symbol CSV files consumed by `CsvBarSource`.
    pub bars_dir: String,
    /// SQLite path for the bar/indicator/correlation store.
    pub store_path: String,
    /// SQLite path for the Auto-Logger's signal/price-history store.
    pub auto_logger_db: String,
    /// Directory learning artifacts (patterns, rules, versions, reports) are written to.
    pub artifacts_dir: String,
    pub tuning: TuningConfig,
    pub auto_logger: AutoLoggerConfig,
    pub factory: FactoryConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bars_dir: "./bars".to_string(),
            store_path: "./goldloop.db".to_string(),
            auto_logger_db: "./auto_logger.db".to_string(),
            artifacts_dir: "./artifacts".to_string(),
            tuning: TuningConfig::default(),
            auto_logger: AutoLoggerConfig::default(),
            factory: FactoryConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load from a TOML file, falling back to defaults for any field the
    /// file omits. A missing file is not an error — it means "no overrides",
    /// matching the inbound-data traits' permissive treatment of absence.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Deterministic content hash of the resolved configuration.
    pub fn config_id(&self) -> ConfigId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
