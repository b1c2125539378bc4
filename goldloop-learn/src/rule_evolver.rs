//! Rule Evolver — genetic search over a population of `TradingRule`s.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use goldloop_core::domain::{Session, Trend};

use crate::domain::{Condition, Direction, DiscoveredPattern, Operator, OutcomeRecord, TradingRule, WinLoss};

const ELITE_COUNT: usize = 5;
const MIN_MATCHES_FOR_FITNESS: usize = 10;
const FULL_CONFIDENCE_MATCHES: f64 = 20.0;
/// Declared range each indicator's condition threshold may mutate within.
const INDICATOR_RANGE: [(&str, f64, f64); 4] =
    [("rsi", 0.0, 100.0), ("stoch_k", 0.0, 100.0), ("adx", 0.0, 100.0), ("atr_percentile", 0.0, 100.0)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolverConfig {
    pub population_size: usize,
    pub elite_count: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub generations: u32,
    pub top_n_patterns_seed: usize,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            elite_count: ELITE_COUNT,
            crossover_rate: 0.6,
            mutation_rate: 0.3,
            generations: 15,
            top_n_patterns_seed: 10,
        }
    }
}

fn indicator_range(indicator: &str) -> (f64, f64) {
    INDICATOR_RANGE
        .iter()
        .find(|(name, _, _)| *name == indicator)
        .map(|(_, lo, hi)| (*lo, *hi))
        .unwrap_or((0.0, 100.0))
}

fn random_condition(rng: &mut impl Rng) -> (String, Condition) {
    let indicator = INDICATOR_RANGE[rng.gen_range(0..INDICATOR_RANGE.len())].0;
    let (lo, hi) = indicator_range(indicator);
    let op = if rng.gen_bool(0.5) { Operator::Lt } else { Operator::Gt };
    let threshold = rng.gen_range(lo..=hi);
    (indicator.to_string(), Condition { op, threshold })
}

fn random_rule(generation: u32, rng: &mut impl Rng) -> TradingRule {
    let n_conditions = rng.gen_range(1..=3);
    let mut conditions = BTreeMap::new();
    let mut pool: Vec<&str> = INDICATOR_RANGE.iter().map(|(name, _, _)| *name).collect();
    pool.shuffle(rng);
    for indicator in pool.into_iter().take(n_conditions) {
        let (lo, hi) = indicator_range(indicator);
        let op = if rng.gen_bool(0.5) { Operator::Lt } else { Operator::Gt };
        conditions.insert(indicator.to_string(), Condition { op, threshold: rng.gen_range(lo..=hi) });
    }

    let regime_filter = match rng.gen_range(0..6) {
        0 => Some(Trend::StrongUptrend),
        1 => Some(Trend::WeakUptrend),
        2 => Some(Trend::Ranging),
        3 => Some(Trend::WeakDowntrend),
        4 => Some(Trend::StrongDowntrend),
        _ => None,
    };
    let session_filter = match rng.gen_range(0..5) {
        0 => Some(Session::Asia),
        1 => Some(Session::London),
        2 => Some(Session::Overlap),
        3 => Some(Session::Newyork),
        _ => None,
    };
    let direction = if rng.gen_bool(0.5) { Direction::Long } else { Direction::Short };

    TradingRule {
        rule_id: format!("rule_{:x}", rng.gen::<u64>()),
        generation,
        conditions,
        regime_filter,
        session_filter,
        direction,
        weight: rng.gen_range(1..=10),
        fitness: 0.0,
        win_rate: 0.0,
        profit_factor: 0.0,
        total_trades: 0,
        parent_ids: Vec::new(),
        mutations: Vec::new(),
    }
}

fn rule_from_pattern(pattern: &DiscoveredPattern, generation: u32) -> TradingRule {
    let weight = ((pattern.confidence / 10.0).round() as i64).clamp(1, 10) as u8;
    TradingRule {
        rule_id: format!("seed_{}", pattern.confidence as u64),
        generation,
        conditions: pattern.conditions.clone(),
        regime_filter: pattern.best_regime,
        session_filter: pattern.best_session,
        direction: pattern.direction,
        weight,
        fitness: 0.0,
        win_rate: pattern.win_rate,
        profit_factor: pattern.profit_factor,
        total_trades: pattern.sample_size,
        parent_ids: Vec::new(),
        mutations: Vec::new(),
    }
}

fn indicator_values(record: &OutcomeRecord) -> BTreeMap<&str, f64> {
    let mut values = BTreeMap::new();
    values.insert("rsi", record.rsi);
    values.insert("stoch_k", record.stoch_k);
    values.insert("adx", record.adx);
    values.insert("atr_percentile", record.atr_percentile);
    values
}

/// `fitness = (win_rate-50)*2 + (profit_factor-1)*20 + min(matches/5, 20)`,
/// halved if matches < 20, 0 below the 10-match floor.
pub fn fitness(rule: &TradingRule, history: &[OutcomeRecord]) -> (f64, f64, f64, usize) {
    let matches: Vec<&OutcomeRecord> = history
        .iter()
        .filter(|r| rule.matches(&indicator_values(r), r.regime, r.session, rule.direction))
        .collect();
    let n = matches.len();
    if n < MIN_MATCHES_FOR_FITNESS {
        return (0.0, 0.0, 0.0, n);
    }
    let wins = matches.iter().filter(|r| r.outcome == WinLoss::Win).count();
    let win_rate = wins as f64 / n as f64 * 100.0;
    let gross_win: f64 = matches.iter().filter(|r| r.outcome == WinLoss::Win).map(|r| r.pnl.abs()).sum();
    let gross_loss: f64 = matches.iter().filter(|r| r.outcome == WinLoss::Loss).map(|r| r.pnl.abs()).sum();
    let profit_factor = if gross_loss > 0.0 { gross_win / gross_loss } else { 0.0 };

    let mut score = (win_rate - 50.0) * 2.0 + (profit_factor - 1.0) * 20.0 + (n as f64 / 5.0).min(FULL_CONFIDENCE_MATCHES);
    if n < 20 {
        score *= 0.5;
    }
    (score.max(0.0), win_rate, profit_factor, n)
}

fn evaluate_population(population: &mut [TradingRule], history: &[OutcomeRecord]) {
    for rule in population.iter_mut() {
        let (fit, win_rate, profit_factor, matches) = fitness(rule, history);
        rule.fitness = fit;
        rule.win_rate = win_rate;
        rule.profit_factor = profit_factor;
        rule.total_trades = matches;
    }
}

fn tournament_select<'a>(sorted: &'a [TradingRule], rng: &mut impl Rng) -> &'a TradingRule {
    (0..5)
        .map(|_| &sorted[rng.gen_range(0..sorted.len())])
        .max_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap())
        .unwrap()
}

/// Union of both parents' condition keys: shared keys get a floor-averaged
/// threshold and a random operator choice between the parents'; exclusive
/// keys inherit directly. Direction from the strictly fitter parent
/// (ties resolve to parent2). Weight is the floor-average.
fn crossover(parent1: &TradingRule, parent2: &TradingRule, generation: u32, rng: &mut impl Rng) -> TradingRule {
    let mut conditions = BTreeMap::new();
    for key in parent1.conditions.keys().chain(parent2.conditions.keys()) {
        if conditions.contains_key(key) {
            continue;
        }
        let cond = match (parent1.conditions.get(key), parent2.conditions.get(key)) {
            (Some(c1), Some(c2)) => {
                let threshold = ((c1.threshold + c2.threshold) / 2.0).trunc();
                let op = if rng.gen_bool(0.5) { c1.op } else { c2.op };
                Condition { op, threshold }
            }
            (Some(c), None) | (None, Some(c)) => *c,
            (None, None) => unreachable!(),
        };
        conditions.insert(key.clone(), cond);
    }

    let regime_filter = if rng.gen_bool(0.5) { parent1.regime_filter } else { parent2.regime_filter };
    let session_filter = if rng.gen_bool(0.5) { parent1.session_filter } else { parent2.session_filter };
    let direction = if parent1.fitness > parent2.fitness { parent1.direction } else { parent2.direction };
    let weight = (((parent1.weight as f64 + parent2.weight as f64) / 2.0).floor() as i64).clamp(1, 10) as u8;

    TradingRule {
        rule_id: format!("rule_{:x}", rng.gen::<u64>()),
        generation,
        conditions,
        regime_filter,
        session_filter,
        direction,
        weight,
        fitness: 0.0,
        win_rate: 0.0,
        profit_factor: 0.0,
        total_trades: 0,
        parent_ids: vec![parent1.rule_id.clone(), parent2.rule_id.clone()],
        mutations: Vec::new(),
    }
}

/// Deep-copies `rule` then independently applies each mutation roll,
/// logging a short description of every applied change.
fn mutate(rule: &TradingRule, rng: &mut impl Rng) -> TradingRule {
    let mut child = rule.clone();
    child.parent_ids = vec![rule.rule_id.clone()];
    child.rule_id = format!("rule_{:x}", rng.gen::<u64>());
    child.fitness = 0.0;
    child.win_rate = 0.0;
    child.profit_factor = 0.0;
    child.total_trades = 0;
    child.mutations.clear();

    for (indicator, cond) in child.conditions.iter_mut() {
        if rng.gen_bool(0.3) {
            let delta = nonzero_delta(rng);
            let (lo, hi) = indicator_range(indicator);
            let old = cond.threshold;
            cond.threshold = (cond.threshold + delta).clamp(lo, hi);
            child.mutations.push(format!("nudged {indicator} threshold {old} -> {}", cond.threshold));
        }
        if rng.gen_bool(0.1) {
            cond.op = match cond.op {
                Operator::Lt => Operator::Gt,
                Operator::Gt => Operator::Lt,
            };
            child.mutations.push(format!("flipped {indicator} operator"));
        }
    }
    if rng.gen_bool(0.15) {
        child.regime_filter = match rng.gen_range(0..6) {
            0 => Some(Trend::StrongUptrend),
            1 => Some(Trend::WeakUptrend),
            2 => Some(Trend::Ranging),
            3 => Some(Trend::WeakDowntrend),
            4 => Some(Trend::StrongDowntrend),
            _ => None,
        };
        child.mutations.push("re-rolled regime filter".to_string());
    }
    if rng.gen_bool(0.15) {
        child.session_filter = match rng.gen_range(0..5) {
            0 => Some(Session::Asia),
            1 => Some(Session::London),
            2 => Some(Session::Overlap),
            3 => Some(Session::Newyork),
            _ => None,
        };
        child.mutations.push("re-rolled session filter".to_string());
    }
    if rng.gen_bool(0.2) {
        let delta: i64 = if rng.gen_bool(0.5) { 1 } else { -1 };
        let old = child.weight;
        child.weight = ((child.weight as i64 + delta).clamp(1, 10)) as u8;
        child.mutations.push(format!("nudged weight {old} -> {}", child.weight));
    }
    child
}

/// A signed delta in `[-10,-1] U [1,10]`, excluding 0 so "mutate" stays
/// meaningful.
fn nonzero_delta(rng: &mut impl Rng) -> f64 {
    let magnitude = rng.gen_range(1..=10) as f64;
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

fn generation_step(population: Vec<TradingRule>, config: &EvolverConfig, history: &[OutcomeRecord], generation: u32, rng: &mut impl Rng) -> Vec<TradingRule> {
    let mut sorted = population;
    sorted.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());

    let mut next: Vec<TradingRule> = sorted.iter().take(config.elite_count).cloned().collect();
    let fitter_half = &sorted[..(sorted.len() / 2).max(1)];

    while next.len() < config.population_size {
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll < config.crossover_rate {
            let p1 = tournament_select(&sorted, rng);
            let p2 = tournament_select(&sorted, rng);
            next.push(crossover(p1, p2, generation, rng));
        } else {
            let roll2: f64 = rng.gen_range(0.0..1.0);
            if roll2 < config.mutation_rate {
                let parent = &fitter_half[rng.gen_range(0..fitter_half.len())];
                next.push(mutate(parent, rng));
            } else {
                next.push(random_rule(generation, rng));
            }
        }
    }

    evaluate_population(&mut next, history);
    next
}

/// Run `config.generations` steps, seeding from the top
/// `config.top_n_patterns_seed` discovered patterns and padding the rest
/// of the population with random rules. Returns the final population
/// sorted by fitness descending.
pub fn run_evolution(
    patterns: &[DiscoveredPattern],
    history: &[OutcomeRecord],
    config: &EvolverConfig,
    seed: u64,
) -> Vec<TradingRule> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let mut population: Vec<TradingRule> =
        patterns.iter().take(config.top_n_patterns_seed).map(|p| rule_from_pattern(p, 0)).collect();
    while population.len() < config.population_size {
        population.push(random_rule(0, &mut rng));
    }
    evaluate_population(&mut population, history);

    for generation in 1..=config.generations {
        population = generation_step(population, config, history, generation, &mut rng);
    }

    population.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());
    population
}
