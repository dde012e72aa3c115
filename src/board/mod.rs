//! Board representation and game-state types.
//!
//! Contains the map graph, cards, orders and players.

pub mod card;
pub mod map;
pub mod order;
pub mod player;

#[cfg(test)]
pub(crate) mod fixtures;

pub use card::{random_card, Card, CardKind, DEALT_KINDS};
pub use map::{Continent, ContinentId, Country, CountryId, Map, SERIAL_BASE};
pub use order::{Order, OrderKind};
pub use player::Player;
