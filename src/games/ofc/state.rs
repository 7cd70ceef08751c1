//! Game state for Open-Face Chinese Poker.
//!
//! Each side builds three lines (top 3 cards, middle 5, bottom 5). The
//! first hand deals five cards; every later hand deals three, of which two
//! are placed and one discarded, so thirteen placements fill the table.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::card::{Card, Deck};
use super::GameError;
use crate::cfr::game::Action;

/// Number of hands dealt in a game.
pub const MAX_ROUNDS: u32 = 5;

/// Cards dealt in the first hand.
pub const FIRST_HAND_SIZE: usize = 5;

/// Cards dealt in each later hand.
pub const NEXT_HAND_SIZE: usize = 3;

/// Cards placed from each later hand; the rest are discarded.
pub const NEXT_HAND_PLACED: usize = 2;

/// A placement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Line {
    /// Three-card front line
    Top,
    /// Five-card middle line
    Middle,
    /// Five-card back line
    Bottom,
}

impl Line {
    /// All lines, top to bottom.
    pub const ALL: [Line; 3] = [Line::Top, Line::Middle, Line::Bottom];

    /// Maximum number of cards in this line.
    pub fn capacity(&self) -> usize {
        match self {
            Line::Top => 3,
            Line::Middle | Line::Bottom => 5,
        }
    }
}

impl Action for Line {
    fn key(&self) -> String {
        match self {
            Line::Top => "top".to_string(),
            Line::Middle => "middle".to_string(),
            Line::Bottom => "bottom".to_string(),
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "top" => Some(Line::Top),
            "middle" => Some(Line::Middle),
            "bottom" => Some(Line::Bottom),
            _ => None,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// One side's three lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Front line, up to 3 cards
    pub top: Vec<Card>,
    /// Middle line, up to 5 cards
    pub middle: Vec<Card>,
    /// Back line, up to 5 cards
    pub bottom: Vec<Card>,
}

impl Table {
    /// Cards in a line.
    pub fn line(&self, line: Line) -> &[Card] {
        match line {
            Line::Top => &self.top,
            Line::Middle => &self.middle,
            Line::Bottom => &self.bottom,
        }
    }

    fn line_mut(&mut self, line: Line) -> &mut Vec<Card> {
        match line {
            Line::Top => &mut self.top,
            Line::Middle => &mut self.middle,
            Line::Bottom => &mut self.bottom,
        }
    }

    /// Place a card at the end of a line.
    pub fn place(&mut self, line: Line, card: Card) -> Result<(), GameError> {
        let cards = self.line_mut(line);
        if cards.len() >= line.capacity() {
            return Err(GameError::LineFull(line));
        }
        cards.push(card);
        Ok(())
    }

    /// Lines that still have room, top to bottom.
    pub fn open_lines(&self) -> Vec<Line> {
        Line::ALL
            .into_iter()
            .filter(|&l| self.line(l).len() < l.capacity())
            .collect()
    }

    /// Check whether every line is full.
    pub fn is_complete(&self) -> bool {
        self.open_lines().is_empty()
    }

    /// Number of cards placed.
    pub fn len(&self) -> usize {
        self.top.len() + self.middle.len() + self.bottom.len()
    }

    /// Check if no card has been placed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strength of a line: the sum of its card values.
    pub fn strength(&self, line: Line) -> u32 {
        self.line(line).iter().map(Card::value).sum()
    }

    /// Lines must not get weaker from bottom to top.
    pub fn is_valid(&self) -> bool {
        let top = self.strength(Line::Top);
        let middle = self.strength(Line::Middle);
        let bottom = self.strength(Line::Bottom);
        top <= middle && middle <= bottom
    }
}

/// Per-line points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineScores {
    /// Points won on the top line
    pub top: u32,
    /// Points won on the middle line
    pub middle: u32,
    /// Points won on the bottom line
    pub bottom: u32,
}

impl LineScores {
    fn add(&mut self, line: Line) {
        match line {
            Line::Top => self.top += 1,
            Line::Middle => self.middle += 1,
            Line::Bottom => self.bottom += 1,
        }
    }

    /// Total points.
    pub fn total(&self) -> u32 {
        self.top + self.middle + self.bottom
    }
}

/// Result of comparing both tables line by line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    /// Human player's points
    pub player: LineScores,
    /// AI points
    pub ai: LineScores,
}

impl Scores {
    /// AI points minus player points.
    pub fn net_for_ai(&self) -> i32 {
        self.ai.total() as i32 - self.player.total() as i32
    }
}

/// Full state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfcState {
    /// Undealt cards
    pub deck: Deck,
    /// Human player's lines
    pub player_table: Table,
    /// AI lines
    pub ai_table: Table,
    /// Cards waiting to be placed
    pub current_hand: Vec<Card>,
    /// Every card dealt so far
    pub used_cards: Vec<Card>,
    /// Current hand number, starting at 1
    pub round: u32,
}

impl OfcState {
    /// Start a game: shuffle and deal the first hand.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Deck::shuffled(rng);
        let current_hand = deck.take(FIRST_HAND_SIZE);

        Self {
            deck,
            player_table: Table::default(),
            ai_table: Table::default(),
            used_cards: current_hand.clone(),
            current_hand,
            round: 1,
        }
    }

    /// Check whether all hands have been dealt.
    pub fn is_over(&self) -> bool {
        self.round >= MAX_ROUNDS
    }

    /// Deal the next hand, replacing whatever is left of the current one.
    pub fn deal_next_hand(&mut self) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let hand = self.deck.deal(NEXT_HAND_SIZE)?;
        self.used_cards.extend_from_slice(&hand);
        self.current_hand = hand;
        self.round += 1;
        Ok(())
    }

    /// Deal cards outside the current hand, such as the opponent's.
    pub fn deal_cards(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        let cards = self.deck.deal(n)?;
        self.used_cards.extend_from_slice(&cards);
        Ok(cards)
    }

    /// How many cards from the current hand get placed this round.
    pub fn placements_this_round(&self) -> usize {
        if self.round <= 1 {
            FIRST_HAND_SIZE
        } else {
            NEXT_HAND_PLACED
        }
    }

    /// Compare both tables line by line.
    ///
    /// The player takes a line only with strictly greater strength; ties go
    /// to the AI.
    pub fn scores(&self) -> Scores {
        let mut scores = Scores::default();
        for line in Line::ALL {
            if self.player_table.strength(line) > self.ai_table.strength(line) {
                scores.player.add(line);
            } else {
                scores.ai.add(line);
            }
        }
        scores
    }
}
