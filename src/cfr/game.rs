//! Collaborator traits between the engine and the game that drives it.
//!
//! The engine works on plain string keys. Host games describe their actions
//! and decision points through these traits so the keys stay canonical.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for actions that can be taken at a decision point.
///
/// Actions must be cloneable, comparable, and hashable for storage in maps.
pub trait Action: Clone + Eq + Hash + Debug {
    /// Stable identifier used as the action key in the engine tables.
    fn key(&self) -> String;

    /// Parse an action back from its key.
    fn from_key(key: &str) -> Option<Self>;
}

/// Trait for information states (what a player knows at a decision point).
///
/// Two decision contexts that look identical to the player must produce the
/// same key. Keys should project only the features relevant to the decision;
/// a key that includes the whole mutable game state almost never recurs, so
/// regret would never accumulate across visits.
pub trait InfoState: Clone + Eq + Hash + Debug {
    /// Generate a unique string key for this information state.
    fn key(&self) -> String;
}

/// Collect the keys of a slice of actions.
pub fn action_keys<A: Action>(actions: &[A]) -> Vec<String> {
    actions.iter().map(Action::key).collect()
}
