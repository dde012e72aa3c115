//! Order resolution.
//!
//! Combat arithmetic, the per-round reinforcement allotment, and the
//! execution and expiry of individual orders against the board.

pub mod combat;
pub mod execute;
pub mod reinforcement;

pub use combat::{resolve_battle, BattleOutcome};
pub use execute::World;
pub use reinforcement::{reinforcement_allotment, MIN_REINFORCEMENT};
