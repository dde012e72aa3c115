//! Reinforcement allotment.

use crate::board::Map;

/// No player receives fewer armies than this per round.
pub const MIN_REINFORCEMENT: u32 = 3;

/// Armies `player` receives at the start of a round: one per three owned
/// countries plus the bonus of every fully owned continent, at least
/// [`MIN_REINFORCEMENT`].
pub fn reinforcement_allotment(map: &Map, player: &str) -> u32 {
    let owned = u32::try_from(map.owned_count(player)).unwrap_or(u32::MAX);
    let bonus = map
        .continents()
        .filter(|c| map.owns_continent(player, c.id()))
        .map(|c| c.control_value())
        .fold(0, u32::saturating_add);
    (owned / 3).saturating_add(bonus).max(MIN_REINFORCEMENT)
}
