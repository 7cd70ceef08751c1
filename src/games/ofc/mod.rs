//! Open-Face Chinese Poker placement.
//!
//! The host side of the engine: dealing, line validation, scoring, and the
//! projection of a placement decision onto an information-set key.
//!
//! ## Game Rules
//!
//! - Each side builds three lines: top (3 cards), middle (5), bottom (5)
//! - Hand 1 deals 5 cards, all placed
//! - Hands 2-5 deal 3 cards, 2 placed and 1 discarded
//! - A line's strength is the sum of its card values (2-14)
//! - A table is valid when top ≤ middle ≤ bottom
//! - Each line scores one point for the stronger side; ties go to the AI
//!
//! ## Decision Points
//!
//! ```text
//! deal hand
//! └── for each card to place
//!     ├── project OfcInfoState (round, rank, line fill)
//!     ├── register open lines
//!     └── sample line from regret-matching strategy
//! game over → credit net score to every decision
//! ```

pub mod agent;
pub mod card;
pub mod info_state;
pub mod state;

pub use agent::{OfcAgent, Placement};
pub use card::{Card, Deck};
pub use info_state::OfcInfoState;
pub use state::{Line, LineScores, OfcState, Scores, Table, MAX_ROUNDS};

use crate::cfr::error::EngineError;

/// Errors from game operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No card left in the current hand.
    #[error("current hand is empty")]
    EmptyHand,
    /// Every AI line is full.
    #[error("no line has room for another card")]
    NoLegalLine,
    /// The chosen line is at capacity.
    #[error("{0} line is full")]
    LineFull(Line),
    /// All hands have been dealt.
    #[error("game is over")]
    GameOver,
    /// Not enough cards left to deal.
    #[error("deck has {left} cards, {wanted} requested")]
    DeckExhausted {
        /// Cards requested
        wanted: usize,
        /// Cards left in the deck
        left: usize,
    },
    /// A card string could not be parsed.
    #[error("invalid card {0:?}")]
    InvalidCard(String),
    /// The engine returned an action that is not a line.
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    /// The engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
