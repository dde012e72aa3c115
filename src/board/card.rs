//! Playable cards.
//!
//! Cards are dealt to a player who conquers a country and spent when the
//! matching order executes. A card carries no mutable state after it is
//! dealt.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The kind of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardKind {
    Airlift,
    Bomb,
    Blockade,
    Diplomacy,
    Empty,
}

/// Card kinds that can be dealt. `Empty` never is.
pub const DEALT_KINDS: [CardKind; 4] = [
    CardKind::Airlift,
    CardKind::Bomb,
    CardKind::Blockade,
    CardKind::Diplomacy,
];

impl CardKind {
    /// Returns the display name of the card kind.
    pub const fn name(self) -> &'static str {
        match self {
            CardKind::Airlift => "Airlift",
            CardKind::Bomb => "Bomb",
            CardKind::Blockade => "Blockade",
            CardKind::Diplomacy => "Diplomacy",
            CardKind::Empty => "Empty",
        }
    }

    /// Parses a card kind from its name, case-insensitively.
    pub fn from_name(s: &str) -> Option<CardKind> {
        match s.to_ascii_lowercase().as_str() {
            "airlift" => Some(CardKind::Airlift),
            "bomb" => Some(CardKind::Bomb),
            "blockade" => Some(CardKind::Blockade),
            "diplomacy" | "negotiate" => Some(CardKind::Diplomacy),
            "empty" => Some(CardKind::Empty),
            _ => None,
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A card in a player's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    kind: CardKind,
    dealt_round: u32,
}

impl Card {
    /// Creates a card dealt during the given round.
    pub fn new(kind: CardKind, dealt_round: u32) -> Self {
        Card { kind, dealt_round }
    }

    pub fn kind(&self) -> CardKind {
        self.kind
    }

    /// The round in which the card was dealt.
    pub fn dealt_round(&self) -> u32 {
        self.dealt_round
    }
}

/// Draws a card kind uniformly from the dealt kinds.
pub fn random_card(rng: &mut impl Rng) -> CardKind {
    DEALT_KINDS[rng.gen_range(0..DEALT_KINDS.len())]
}
