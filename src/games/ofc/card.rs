//! Card representation for Open-Face Chinese Poker.
//!
//! - `Card`: a single playing card with rank and suit
//! - `Deck`: a shuffled 52-card deck that deals from the top

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::GameError;

/// Rank labels, index 0-12: 2-A.
const RANK_LABELS: [&str; 13] = [
    "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A",
];

/// Suit symbols, index 0-3.
const SUIT_CHARS: [char; 4] = ['♠', '♥', '♦', '♣'];

/// A single playing card.
///
/// Serialized as its display string (`"10♠"`, `"A♥"`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Card {
    /// Card index 0-51: rank * 4 + suit
    id: u8,
}

impl Card {
    /// Create a new card from rank (0-12) and suit (0-3).
    #[inline]
    pub fn new(rank: u8, suit: u8) -> Self {
        debug_assert!(rank < 13, "rank must be 0-12");
        debug_assert!(suit < 4, "suit must be 0-3");
        Self { id: rank * 4 + suit }
    }

    /// Parse a card from a string like "10♠", "A♥", "2♣".
    pub fn parse(s: &str) -> Option<Self> {
        let suit_char = s.chars().last()?;
        let rank_label = &s[..s.len() - suit_char.len_utf8()];

        let rank = RANK_LABELS.iter().position(|&r| r == rank_label)?;
        let suit = SUIT_CHARS.iter().position(|&c| c == suit_char)?;

        Some(Self::new(rank as u8, suit as u8))
    }

    /// Get the card's rank (0-12: 2-A).
    #[inline]
    pub fn rank(&self) -> u8 {
        self.id / 4
    }

    /// Get the card's suit (0-3).
    #[inline]
    pub fn suit(&self) -> u8 {
        self.id % 4
    }

    /// Face value used for line strength: 2-14.
    #[inline]
    pub fn value(&self) -> u32 {
        self.rank() as u32 + 2
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            RANK_LABELS[self.rank() as usize],
            SUIT_CHARS[self.suit() as usize]
        )
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.to_string()
    }
}

impl TryFrom<String> for Card {
    type Error = GameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Card::parse(&s).ok_or(GameError::InvalidCard(s))
    }
}

/// A deck of cards, dealt from the front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// Create a full deck in standard order.
    pub fn new() -> Self {
        let cards = (0..4u8)
            .flat_map(|suit| (0..13u8).map(move |rank| Card::new(rank, suit)))
            .collect();
        Self { cards }
    }

    /// Create a full deck and shuffle it.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::new();
        deck.cards.shuffle(rng);
        deck
    }

    /// Deal `n` cards from the top.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        if n > self.cards.len() {
            return Err(GameError::DeckExhausted {
                wanted: n,
                left: self.cards.len(),
            });
        }
        Ok(self.take(n))
    }

    /// Deal up to `n` cards from the top.
    pub fn take(&mut self, n: usize) -> Vec<Card> {
        let n = n.min(self.cards.len());
        self.cards.drain(..n).collect()
    }

    /// Number of cards left.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the deck is empty.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Remaining cards in dealing order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
