//! Error taxonomy shared by every layer of the engine.
//!
//! In-game failures (an attack that cannot happen, a deploy onto a lost
//! country) are not errors: orders report them as outcome messages. The
//! variants here cover malformed input, failed lookups, broken maps and
//! corrupt saved games.

use thiserror::Error;

use crate::board::card::CardKind;

/// Errors surfaced by the engine to its callers.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{kind} '{name}' not found")]
    EntityNotFound { kind: &'static str, name: String },

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("map file has no [{0}] section")]
    AbsentTag(String),

    #[error("invalid game: {0}")]
    InvalidGame(String),

    #[error("player '{player}' holds no {card} card")]
    CardNotFound { player: String, card: CardKind },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GameError {
    /// Shorthand for a failed lookup.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        GameError::EntityNotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GameError>;
