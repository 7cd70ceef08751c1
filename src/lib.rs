//! # OFC Regret
//!
//! A regret-matching strategy engine for Open-Face Chinese Poker card
//! placement.
//!
//! ## Features
//!
//! - **Regret Matching**: Strategy proportional to positive cumulative regret
//! - **Explicit Action Sets**: Actions are registered per information set
//! - **Reproducible Sampling**: Seeded or injected random source
//! - **Persistence**: JSON progress document, locally or in a remote content store
//! - **Average Strategy**: Normalized strategy sums for every state
//!
//! ## Quick Start
//!
//! ```
//! use ofc_regret::cfr::{EngineConfig, RegretEngine};
//! use ofc_regret::games::ofc::{OfcAgent, OfcState};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let mut state = OfcState::new(&mut rng);
//! let mut agent = OfcAgent::new(RegretEngine::new(EngineConfig::default().with_seed(1)));
//!
//! // Place the first hand, then reward the decisions.
//! agent.play_hand(&mut state).unwrap();
//! agent.record_outcome(1.0);
//! assert_eq!(state.ai_table.len(), 5);
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: Regret-matching engine, storage and persistence
//! - [`games`]: Game implementations (Open-Face Chinese Poker)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     RegretEngine (Generic)                      │
//! │  - Regret accumulation    - Strategy computation                │
//! │  - Action sampling        - Persist / restore                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ state keys, action keys, regret
//!                               │
//!                       ┌───────────────┐
//!                       │   OfcAgent    │
//!                       │ deal / score  │
//!                       └───────────────┘
//! ```

#![warn(missing_docs)]

/// Regret-matching engine module.
///
/// This is the core module containing the tables and the regret-matching
/// algorithm.
pub mod cfr;

/// Game implementations module.
///
/// Contains the Open-Face Chinese Poker collaborator that drives the engine.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{Action, EngineConfig, EngineError, InfoState, RegretEngine, SharedEngine};
