//! Game implementations driven by the regret-matching engine.
//!
//! ## Available Games
//!
//! - [`ofc`]: Open-Face Chinese Poker card placement
//!
//! ## Adding New Games
//!
//! 1. Create a new module under `src/games/`
//! 2. Define action and info state types
//! 3. Implement `Action` and `InfoState`
//! 4. Register the legal actions before each `sample_action` call

pub mod ofc;
