//! Regret-matching engine module.
//!
//! This module provides the strategy-update primitive of Monte Carlo CFR:
//! per-state cumulative regret, a strategy derived from it by regret
//! matching, and sampling of one action from that strategy.
//!
//! # Usage
//!
//! 1. Project each decision point to an information-set key (`InfoState`)
//! 2. Register the actions available there
//! 3. Call `sample_action()` to pick one
//! 4. Feed the observed outcome back with `accumulate_regret()`
//! 5. `persist()` / `restore()` the tables between runs
//!
//! # Example
//!
//! ```
//! use ofc_regret::cfr::{EngineConfig, RegretEngine};
//!
//! let mut engine = RegretEngine::new(EngineConfig::default().with_seed(3));
//! engine.accumulate_regret("state", "A", 3.0);
//! engine.accumulate_regret("state", "B", 1.0);
//! engine.accumulate_regret("state", "C", -2.0);
//!
//! let strategy = engine.compute_strategy("state").unwrap();
//! assert_eq!(strategy["A"], 0.75);
//! assert_eq!(strategy["B"], 0.25);
//! assert_eq!(strategy["C"], 0.0);
//! ```
//!
//! # Theory
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//! When no regret is positive the strategy is uniform.
//!
//! The strategy sum accumulates every computed strategy; its normalization
//! is the average strategy, which is what converges in full CFR.
//!
//! # References
//!
//! - Hart, S., Mas-Colell, A. "A Simple Adaptive Procedure Leading to Correlated Equilibrium" (2000)
//! - Lanctot, M., et al. "Monte Carlo Sampling for Regret Minimization in Extensive Games" (2009)

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod remote;
pub mod storage;

// Re-export main types for convenient access
pub use config::{ConfigError, EngineConfig, RemoteConfig};
pub use engine::{RegretEngine, SharedEngine};
pub use error::{EngineError, EngineResult, StorageError};
pub use game::{Action, InfoState};
pub use remote::{ContentStore, GithubContents, RemoteDocument};
pub use storage::{ProgressDocument, RegretStorage, Strategy};
