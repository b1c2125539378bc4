//! Strategy Factory — orchestrates Miner -> Evolver -> Tuner -> Version ->
//! deploy-gate -> export, the learning cycle's single commit point.

use serde::{Deserialize, Serialize};

use goldloop_core::domain::TuningConfig;

use crate::auto_tuner::{self, ParamOverride};
use crate::domain::{
    DiscoveredPattern, FirebaseConfig, OutcomeRecord, ProductionConfig, StrategyVersion, StrategyVersionsDocument, TradingRule,
};
use crate::error::{LearnError, Result};
use crate::feedback_loop;
use crate::pattern_miner;
use crate::rule_evolver::{self, EvolverConfig};

const DEFAULT_MIN_IMPROVEMENT_PP: f64 = 5.0;
const TOP_K_RULES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub evolver: EvolverConfig,
    pub min_improvement_pp: f64,
    pub allow_synthetic_fallback: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self { evolver: EvolverConfig::default(), min_improvement_pp: DEFAULT_MIN_IMPROVEMENT_PP, allow_synthetic_fallback: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationOutcome {
    pub iteration: u64,
    pub status: IterationStatus,
    pub version: Option<StrategyVersion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IterationStatus {
    Deployed,
    NotDeployed { reason: String },
    Failed { phase: String, reason: String },
}

/// The full bundle of learning-cycle artifacts, one field per named
/// export: discovered patterns, the evolved rule population, the same
/// rules again under the Pine-bound name (the Pine Script text emitter
/// itself stays out of scope; only this structural shape is retained),
/// the tuned scalar config in both its full and Firebase-scalar-only
/// forms, the version history, the active production config, and the
/// per-iteration results of whatever run produced this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopArtifacts {
    pub discovered_patterns: Vec<DiscoveredPattern>,
    pub evolved_rules: Vec<TradingRule>,
    pub pine_rules: Vec<TradingRule>,
    pub optimized_config: TuningConfig,
    pub firebase_config: FirebaseConfig,
    pub strategy_versions: StrategyVersionsDocument,
    pub production_config: Option<ProductionConfig>,
    pub loop_results: Vec<IterationOutcome>,
}

pub struct StrategyFactory {
    config: FactoryConfig,
    tuning_config: TuningConfig,
    rules: Vec<TradingRule>,
    versions: Vec<StrategyVersion>,
    discovered_patterns: Vec<DiscoveredPattern>,
    loop_results: Vec<IterationOutcome>,
}

impl StrategyFactory {
    pub fn new(config: FactoryConfig, tuning_config: TuningConfig) -> Self {
        Self {
            config,
            tuning_config,
            rules: Vec::new(),
            versions: Vec::new(),
            discovered_patterns: Vec::new(),
            loop_results: Vec::new(),
        }
    }

    pub fn active_version(&self) -> Option<&StrategyVersion> {
        self.versions.iter().find(|v| v.is_active)
    }

    pub fn rules(&self) -> &[TradingRule] {
        &self.rules
    }

    pub fn tuning_config(&self) -> &TuningConfig {
        &self.tuning_config
    }

    /// One learning-cycle iteration. A failure in any phase is isolated
    /// to this iteration's status; the active version is left untouched.
    pub fn run_iteration(&mut self, iteration: u64, history: &[OutcomeRecord], seed: u64) -> IterationOutcome {
        let outcome = match self.run_iteration_inner(history, seed) {
            Ok((version, deployed)) => {
                let status = if deployed {
                    IterationStatus::Deployed
                } else {
                    IterationStatus::NotDeployed {
                        reason: "improvement below min_improvement_pp threshold".to_string(),
                    }
                };
                IterationOutcome { iteration, status, version: Some(version) }
            }
            Err(LearnError::LearningCycleFailed { phase, reason }) => {
                IterationOutcome { iteration, status: IterationStatus::Failed { phase, reason }, version: None }
            }
            Err(other) => IterationOutcome {
                iteration,
                status: IterationStatus::Failed { phase: "unknown".to_string(), reason: other.to_string() },
                version: None,
            },
        };
        self.loop_results.push(outcome.clone());
        outcome
    }

    fn run_iteration_inner(&mut self, history: &[OutcomeRecord], seed: u64) -> Result<(StrategyVersion, bool)> {
        let history = if history.is_empty() {
            pattern_miner::synthetic_history(self.config.allow_synthetic_fallback)
        } else {
            history.to_vec()
        };
        if history.is_empty() {
            return Err(LearnError::LearningCycleFailed {
                phase: "discovery".to_string(),
                reason: "no outcome history and synthetic fallback disabled".to_string(),
            });
        }

        // 1. Discovery.
        let patterns = pattern_miner::mine(&history);
        self.discovered_patterns = patterns.clone();

        // 2. Evolution.
        let population = rule_evolver::run_evolution(&patterns, &history, &self.config.evolver, seed);
        if population.is_empty() {
            return Err(LearnError::LearningCycleFailed {
                phase: "evolution".to_string(),
                reason: "evolver produced an empty population".to_string(),
            });
        }

        // 3. Optimization.
        let overrides: Vec<ParamOverride> = auto_tuner::tune(&history, &self.tuning_config);
        let tuned_config = auto_tuner::apply_overrides(&self.tuning_config, &overrides);

        // 4. Versioning.
        let top_rules: Vec<TradingRule> = population.into_iter().take(TOP_K_RULES).collect();
        let n = top_rules.len().max(1) as f64;
        let win_rate = top_rules.iter().map(|r| r.win_rate).sum::<f64>() / n;
        let profit_factor = top_rules.iter().map(|r| r.profit_factor).sum::<f64>() / n;

        let version_id = format!("v{}", self.versions.len() + 1);
        let new_version = StrategyVersion {
            version_id: version_id.clone(),
            created_at: history.last().expect("checked non-empty above").timestamp,
            rules_count: top_rules.len(),
            win_rate,
            profit_factor,
            is_active: false,
            notes: String::new(),
            rng_seed: seed,
        };

        // 5. Deploy gate.
        let deploy = match self.active_version() {
            None => true,
            Some(active) => new_version.win_rate - active.win_rate >= self.config.min_improvement_pp,
        };

        let mut versioned = new_version.clone();
        if deploy {
            for v in self.versions.iter_mut() {
                v.is_active = false;
            }
            versioned.is_active = true;
            self.rules = top_rules;
            self.tuning_config = tuned_config;
            tracing::info!(version_id = %versioned.version_id, win_rate, "deployed new strategy version");
        }
        self.versions.push(versioned.clone());

        Ok((versioned, deploy))
    }

    /// Run `iterations` passes in sequence; a failed iteration does not
    /// abort the run, it just leaves the active version untouched and
    /// the run continues to the next iteration.
    pub fn run_the_loop(&mut self, iterations: u64, history: &[OutcomeRecord], seed_base: u64) -> Vec<IterationOutcome> {
        (0..iterations)
            .map(|i| {
                let seed = seed_base.wrapping_add(i);
                self.run_iteration(i, history, seed)
            })
            .collect()
    }

    /// The feedback loop's trigger point: evaluate recent-vs-historical
    /// performance and run one iteration only if degradation is detected.
    /// Returns `None` (no iteration run) when the trigger does not fire.
    pub fn run_if_degraded(
        &mut self,
        iteration: u64,
        history: &[OutcomeRecord],
        now: chrono::NaiveDateTime,
        seed: u64,
    ) -> Option<IterationOutcome> {
        let trigger = feedback_loop::evaluate(history, now);
        if !trigger.fired {
            return None;
        }
        tracing::warn!(reasons = ?trigger.reasons, "re-optimization requested by feedback loop");
        Some(self.run_iteration(iteration, history, seed))
    }

    /// 6. Export — the single production-config artifact for the active
    /// version.
    pub fn export(&self) -> Option<ProductionConfig> {
        let active = self.active_version()?;
        Some(ProductionConfig {
            version_id: active.version_id.clone(),
            rules: self.rules.clone(),
            tuning_config: self.tuning_config.clone(),
        })
    }

    pub fn strategy_versions(&self) -> StrategyVersionsDocument {
        StrategyVersionsDocument {
            versions: self.versions.clone(),
            current_id: self.active_version().map(|v| v.version_id.clone()),
        }
    }

    /// The full artifact bundle a completed (or in-progress) learning
    /// cycle writes out: discovered patterns, the evolved rules under
    /// both their own name and the Pine-bound structural alias, the
    /// tuned config in full and Firebase-scalar form, the version
    /// history, the active production config, and every iteration's
    /// result so far.
    pub fn export_artifacts(&self) -> LoopArtifacts {
        LoopArtifacts {
            discovered_patterns: self.discovered_patterns.clone(),
            evolved_rules: self.rules.clone(),
            pine_rules: self.rules.clone(),
            optimized_config: self.tuning_config.clone(),
            firebase_config: FirebaseConfig::from(&self.tuning_config),
            strategy_versions: self.strategy_versions(),
            production_config: self.export(),
            loop_results: self.loop_results.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, WinLoss};
    use chrono::NaiveDate;

    fn synthetic_row(i: i64) -> OutcomeRecord {
        OutcomeRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::hours(i),
            price: 2000.0,
            rsi: 30.0 + (i % 40) as f64,
            stoch_k: 20.0 + (i % 60) as f64,
            adx: 25.0,
            atr_percentile: 50.0,
            regime: goldloop_core::domain::Trend::Ranging,
            session: goldloop_core::domain::Session::London,
            direction: if i % 2 == 0 { Direction::Long } else { Direction::Short },
            outcome: if i % 3 == 0 { WinLoss::Loss } else { WinLoss::Win },
            pnl: if i % 3 == 0 { -8.0 } else { 12.0 },
            hold_minutes: 60,
            score: 65.0,
            rule_ids: Vec::new(),
        }
    }

    #[test]
    fn empty_history_without_synthetic_fallback_fails_the_iteration() {
        let mut factory = StrategyFactory::new(FactoryConfig::default(), TuningConfig::default());
        let outcome = factory.run_iteration(0, &[], 1);
        assert!(matches!(outcome.status, IterationStatus::Failed { .. }));
        assert!(factory.active_version().is_none());
    }

    #[test]
    fn first_successful_iteration_with_no_prior_version_always_deploys() {
        let mut config = FactoryConfig::default();
        config.evolver.generations = 1;
        config.evolver.population_size = 10;
        let mut factory = StrategyFactory::new(config, TuningConfig::default());
        let history: Vec<OutcomeRecord> = (0..60).map(synthetic_row).collect();
        let outcome = factory.run_iteration(0, &history, 7);
        assert!(matches!(outcome.status, IterationStatus::Deployed));
        assert!(factory.active_version().is_some());
        assert!(factory.export().is_some());
    }

    #[test]
    fn deploy_gate_requires_the_configured_improvement_threshold() {
        // 58 -> 60 is a 2pp improvement, below the 5pp default: must not deploy.
        let active = StrategyVersion {
            version_id: "v1".into(),
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            rules_count: 10,
            win_rate: 58.0,
            profit_factor: 1.4,
            is_active: true,
            notes: String::new(),
            rng_seed: 1,
        };
        let candidate_win_rate = 60.0;
        assert!(candidate_win_rate - active.win_rate < DEFAULT_MIN_IMPROVEMENT_PP);

        // 58 -> 64 is a 6pp improvement, above the 5pp default: must deploy.
        let candidate_win_rate = 64.0;
        assert!(candidate_win_rate - active.win_rate >= DEFAULT_MIN_IMPROVEMENT_PP);
    }

    #[test]
    fn run_the_loop_continues_past_a_failed_iteration() {
        let mut config = FactoryConfig::default();
        config.evolver.generations = 1;
        config.evolver.population_size = 10;
        let mut factory = StrategyFactory::new(config, TuningConfig::default());
        let outcomes = factory.run_the_loop(3, &[], 1);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| matches!(o.status, IterationStatus::Failed { .. })));
    }

    #[test]
    fn healthy_history_does_not_trigger_reoptimization() {
        let mut config = FactoryConfig::default();
        config.evolver.generations = 1;
        config.evolver.population_size = 10;
        let mut factory = StrategyFactory::new(config, TuningConfig::default());
        let now = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let history: Vec<OutcomeRecord> = (0..30)
            .map(|i| {
                let mut row = synthetic_row(i);
                row.timestamp = now - chrono::Duration::days(i);
                row.outcome = if i % 10 == 0 { WinLoss::Loss } else { WinLoss::Win };
                row
            })
            .collect();
        assert!(factory.run_if_degraded(0, &history, now, 1).is_none());
    }

    #[test]
    fn degraded_recent_performance_triggers_an_iteration() {
        let mut config = FactoryConfig::default();
        config.evolver.generations = 1;
        config.evolver.population_size = 10;
        let mut factory = StrategyFactory::new(config, TuningConfig::default());
        let now = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

        let mut history: Vec<OutcomeRecord> = (0..20)
            .map(|i| {
                let mut row = synthetic_row(i);
                row.timestamp = now - chrono::Duration::days(10 + i);
                row.outcome = WinLoss::Win;
                row
            })
            .collect();
        history.extend((0..6).map(|i| {
            let mut row = synthetic_row(i);
            row.timestamp = now - chrono::Duration::days(i);
            row.outcome = if i % 2 == 0 { WinLoss::Win } else { WinLoss::Loss };
            row
        }));

        let outcome = factory.run_if_degraded(0, &history, now, 1);
        assert!(outcome.is_some());
    }
}
