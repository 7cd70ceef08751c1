//! Storage for regrets and strategies.
//!
//! This module holds the three tables the engine maintains, keyed by
//! state then action:
//! - **Regrets**: cumulative regret per action
//! - **Strategies**: the most recently computed distribution per action
//! - **Strategy sums**: running total of every computed distribution
//!
//! The outer map is keyed by state. Each state's actions live in a
//! `BTreeMap` so the action order is canonical no matter how entries were
//! inserted or restored.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::error::{EngineError, EngineResult};

/// Per-state values: action key -> number.
pub type ActionTable = BTreeMap<String, f64>;

/// State key -> per-action values.
pub type StateTable = FxHashMap<String, ActionTable>;

/// A probability distribution over action keys.
pub type Strategy = BTreeMap<String, f64>;

/// The engine's tables.
///
/// `RegretStorage` does no locking of its own. Hosts that share one instance
/// between threads wrap the owning engine in a
/// [`SharedEngine`](crate::cfr::SharedEngine).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegretStorage {
    /// Cumulative regrets: state -> action -> regret
    regrets: StateTable,

    /// Last computed strategy: state -> action -> probability
    strategies: StateTable,

    /// Cumulative strategy sums: state -> action -> summed probability
    strategy_sums: StateTable,
}

impl RegretStorage {
    /// Create new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage with pre-allocated capacity for `capacity` states.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            regrets: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            strategies: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            strategy_sums: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Register the actions available at `state`.
    ///
    /// Each action not yet known gets a regret of zero. Existing regrets are
    /// left untouched.
    pub fn register_actions<I, S>(&mut self, state: &str, actions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut actions = actions.into_iter().peekable();
        if actions.peek().is_none() {
            return;
        }
        let entry = self.regrets.entry(state.to_string()).or_default();
        for action in actions {
            entry.entry(action.into()).or_insert(0.0);
        }
    }

    /// Add `delta` to the cumulative regret of `action` at `state`.
    ///
    /// The sum saturates at `f64::MAX` / `f64::MIN` so the tables stay finite
    /// and serializable. A NaN delta is ignored.
    pub fn accumulate_regret(&mut self, state: &str, action: &str, delta: f64) {
        if delta.is_nan() {
            log::warn!("ignoring NaN regret for {:?} at {:?}", action, state);
            return;
        }
        let regret = self
            .regrets
            .entry(state.to_string())
            .or_default()
            .entry(action.to_string())
            .or_insert(0.0);
        *regret = (*regret + delta).clamp(f64::MIN, f64::MAX);
    }

    /// Compute the regret-matching strategy for a state without recording it.
    pub fn current_strategy(&self, state: &str) -> EngineResult<Strategy> {
        match self.regrets.get(state) {
            Some(regrets) if !regrets.is_empty() => Ok(regret_matching(regrets)),
            _ => Err(EngineError::EmptyActionSet {
                state: state.to_string(),
            }),
        }
    }

    /// Compute the current strategy for a state and record it.
    ///
    /// The distribution overwrites the state's strategy entry and is added
    /// element-wise into its strategy sum.
    pub fn compute_strategy(&mut self, state: &str) -> EngineResult<Strategy> {
        let strategy = self.current_strategy(state)?;

        self.strategies.insert(state.to_string(), strategy.clone());

        let sums = self.strategy_sums.entry(state.to_string()).or_default();
        for (action, &prob) in &strategy {
            *sums.entry(action.clone()).or_insert(0.0) += prob;
        }

        Ok(strategy)
    }

    /// Get the average strategy for a state.
    ///
    /// Normalizes the strategy sum. Falls back to uniform over the registered
    /// actions if nothing has been summed yet.
    pub fn average_strategy(&self, state: &str) -> EngineResult<Strategy> {
        let actions = match self.regrets.get(state) {
            Some(regrets) if !regrets.is_empty() => regrets,
            _ => {
                return Err(EngineError::EmptyActionSet {
                    state: state.to_string(),
                })
            }
        };

        let sums = self.strategy_sums.get(state);
        let total: f64 = sums
            .map(|sums| {
                actions
                    .keys()
                    .map(|a| sums.get(a).copied().unwrap_or(0.0))
                    .sum()
            })
            .unwrap_or(0.0);

        match sums {
            Some(sums) if total > 0.0 => Ok(actions
                .keys()
                .map(|a| (a.clone(), sums.get(a).copied().unwrap_or(0.0) / total))
                .collect()),
            _ => Ok(uniform(actions.keys())),
        }
    }

    /// Cumulative regret of one action, if registered.
    pub fn regret(&self, state: &str, action: &str) -> Option<f64> {
        self.regrets.get(state)?.get(action).copied()
    }

    /// Registered actions for a state, in canonical order.
    pub fn actions(&self, state: &str) -> Vec<String> {
        self.regrets
            .get(state)
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Get the number of states stored.
    pub fn num_states(&self) -> usize {
        self.regrets.len()
    }

    /// Check if a state has any registered actions.
    pub fn contains(&self, state: &str) -> bool {
        self.regrets.get(state).is_some_and(|r| !r.is_empty())
    }

    /// Read access to the regret table.
    pub fn regrets(&self) -> &StateTable {
        &self.regrets
    }

    /// Read access to the last computed strategies.
    pub fn strategies(&self) -> &StateTable {
        &self.strategies
    }

    /// Read access to the strategy sums.
    pub fn strategy_sums(&self) -> &StateTable {
        &self.strategy_sums
    }

    /// Check whether every table is empty.
    pub fn is_empty(&self) -> bool {
        self.regrets.is_empty() && self.strategies.is_empty() && self.strategy_sums.is_empty()
    }

    /// Clear all stored data.
    pub fn clear(&mut self) {
        self.regrets.clear();
        self.strategies.clear();
        self.strategy_sums.clear();
    }

    /// Get total memory usage estimate in bytes.
    pub fn memory_usage(&self) -> usize {
        [&self.regrets, &self.strategies, &self.strategy_sums]
            .iter()
            .flat_map(|table| table.iter())
            .map(|(state, actions)| {
                state.len()
                    + actions
                        .keys()
                        .map(|a| a.len() + std::mem::size_of::<f64>())
                        .sum::<usize>()
            })
            .sum()
    }

    /// Export storage to the serializable document format.
    pub fn export(&self) -> ProgressDocument {
        ProgressDocument {
            regret_table: self.regrets.clone(),
            strategy_table: self.strategies.clone(),
            strategy_sum: self.strategy_sums.clone(),
        }
    }

    /// Replace all tables with the contents of a document.
    pub fn import(&mut self, document: ProgressDocument) {
        self.regrets = document.regret_table;
        self.strategies = document.strategy_table;
        self.strategy_sums = document.strategy_sum;
    }
}

/// Regret matching over one state's regrets.
///
/// Probabilities are proportional to the positive part of each regret. If no
/// regret is positive the distribution is uniform.
pub fn regret_matching(regrets: &ActionTable) -> Strategy {
    let mut weights: Vec<f64> = regrets.values().map(|&r| r.max(0.0)).collect();
    let mut total: f64 = weights.iter().sum();

    // Large regrets can overflow the sum; rescale by the largest one.
    if total.is_infinite() {
        let max = weights.iter().copied().fold(0.0, f64::max);
        for w in weights.iter_mut() {
            *w = if max.is_finite() {
                *w / max
            } else if w.is_infinite() {
                1.0
            } else {
                0.0
            };
        }
        total = weights.iter().sum();
    }

    if total > 0.0 {
        regrets
            .keys()
            .zip(weights)
            .map(|(action, w)| (action.clone(), w / total))
            .collect()
    } else {
        uniform(regrets.keys())
    }
}

fn uniform<'a>(actions: impl ExactSizeIterator<Item = &'a String>) -> Strategy {
    let p = 1.0 / actions.len() as f64;
    actions.map(|a| (a.clone(), p)).collect()
}

/// Serializable progress document.
///
/// Field names and nesting are part of the on-disk format: restore only
/// accepts documents with these three two-level maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressDocument {
    /// Cumulative regrets
    pub regret_table: StateTable,
    /// Last computed strategies
    pub strategy_table: StateTable,
    /// Cumulative strategy sums
    pub strategy_sum: StateTable,
}

impl ProgressDocument {
    /// Serialize to JSON text.
    ///
    /// Non-finite values would be written as `null` and could not be read
    /// back, so they are rejected.
    pub fn to_json(&self) -> EngineResult<String> {
        let tables = [
            ("regret_table", &self.regret_table),
            ("strategy_table", &self.strategy_table),
            ("strategy_sum", &self.strategy_sum),
        ];
        for (name, table) in tables {
            for (state, actions) in table {
                if let Some((action, value)) = actions.iter().find(|(_, v)| !v.is_finite()) {
                    return Err(EngineError::MalformedDocument(format!(
                        "{}[{:?}][{:?}] is {}",
                        name, state, action, value
                    )));
                }
            }
        }
        serde_json::to_string(self).map_err(|e| EngineError::MalformedDocument(e.to_string()))
    }

    /// Parse from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> EngineResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| EngineError::MalformedDocument(e.to_string()))
    }
}
