//! Information-set projection for AI placement decisions.
//!
//! The key keeps only what matters for placing one card: the hand number,
//! the rank of the card, and how full each AI line is. Suits and the
//! opponent's table are dropped, so the same situation recurs across games
//! and regret can accumulate on it.

use super::card::Card;
use super::state::{Line, Table};
use crate::cfr::game::InfoState;

/// What the AI knows when placing a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OfcInfoState {
    /// Hand number (1-5)
    pub round: u32,
    /// Rank of the card being placed (0-12: 2-A)
    pub card_rank: u8,
    /// Cards already in each AI line: top, middle, bottom
    pub filled: [u8; 3],
}

impl OfcInfoState {
    /// Project the decision to place `card` onto `table` during `round`.
    pub fn new(round: u32, card: Card, table: &Table) -> Self {
        let filled = Line::ALL.map(|line| table.line(line).len() as u8);
        Self {
            round,
            card_rank: card.rank(),
            filled,
        }
    }

    /// Lines with room left.
    pub fn open_lines(&self) -> Vec<Line> {
        Line::ALL
            .into_iter()
            .zip(self.filled)
            .filter(|(line, n)| (*n as usize) < line.capacity())
            .map(|(line, _)| line)
            .collect()
    }
}

impl InfoState for OfcInfoState {
    fn key(&self) -> String {
        format!(
            "r{}|c{}|{}-{}-{}",
            self.round, self.card_rank, self.filled[0], self.filled[1], self.filled[2]
        )
    }
}
