//! Warzone -- a turn-based territorial conquest engine.
//!
//! Exposes the map and order model, order resolution, the phase-driven game
//! engine, AI strategies, the text protocol and the tournament runner for use
//! by the console binaries and integration tests.

pub mod board;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod resolve;
pub mod strategy;
pub mod tournament;

pub use engine::{GameConfig, GameEngine, Phase};
pub use error::{GameError, Result};
