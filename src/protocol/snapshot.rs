//! Saved-game records.
//!
//! A [`GameSnapshot`] is a plain serde tree describing a whole game: map
//! topology and ownership, players with their hands and queued orders, the
//! deferred-order queue, truces in force, and the round bookkeeping. Orders
//! are stored in command notation so a snapshot stays readable.

use serde::{Deserialize, Serialize};

use super::mapper::order_from_record;
use crate::board::{Card, ContinentId, CountryId, Map, Order, Player};
use crate::engine::phase::Phase;
use crate::error::{GameError, Result};
use crate::strategy::StrategyKind;

/// Current snapshot layout.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinentRecord {
    pub id: ContinentId,
    pub name: String,
    pub control_value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub id: CountryId,
    pub name: String,
    pub continent: ContinentId,
    pub owner: Option<String>,
    pub armies: u32,
    pub neighbors: Vec<CountryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRecord {
    pub continents: Vec<ContinentRecord>,
    pub countries: Vec<CountryRecord>,
}

impl MapRecord {
    pub fn capture(map: &Map) -> Self {
        MapRecord {
            continents: map
                .continents()
                .map(|c| ContinentRecord {
                    id: c.id(),
                    name: c.name().to_string(),
                    control_value: c.control_value(),
                })
                .collect(),
            countries: map
                .countries()
                .map(|c| CountryRecord {
                    id: c.id(),
                    name: c.name().to_string(),
                    continent: c.continent(),
                    owner: c.owner.clone(),
                    armies: c.armies,
                    neighbors: c.neighbors().iter().copied().collect(),
                })
                .collect(),
        }
    }

    pub fn rebuild(&self) -> Result<Map> {
        let mut map = Map::new();
        for c in &self.continents {
            map.restore_continent(c.id, &c.name, c.control_value)
                .map_err(invalid)?;
        }
        for c in &self.countries {
            map.restore_country(c.id, &c.name, c.continent, c.owner.clone(), c.armies)
                .map_err(invalid)?;
        }
        for c in &self.countries {
            for n in &c.neighbors {
                map.add_neighbor_ids(c.id, *n).map_err(invalid)?;
            }
        }
        Ok(map)
    }
}

/// An order in command notation plus its scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub owner: String,
    pub keyword: String,
    pub args: Vec<String>,
    pub seq: u64,
    pub execution_index: u32,
    pub expiry_index: Option<u32>,
}

impl OrderRecord {
    pub fn capture(order: &Order, map: &Map) -> Self {
        OrderRecord {
            owner: order.owner().to_string(),
            keyword: order.kind.keyword().to_string(),
            args: order.kind.arguments(map),
            seq: order.seq(),
            execution_index: order.execution_index(),
            expiry_index: order.expiry_index(),
        }
    }

    pub fn rebuild(&self, map: &Map) -> Result<Order> {
        order_from_record(self, map).map_err(invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub strategy: StrategyKind,
    pub reinforcements: u32,
    pub hand: Vec<Card>,
    pub orders: Vec<OrderRecord>,
    pub truces: Vec<String>,
    pub committed: bool,
    pub eliminated_at: Option<u32>,
}

impl PlayerRecord {
    pub fn capture(player: &Player, map: &Map) -> Self {
        PlayerRecord {
            name: player.name().to_string(),
            strategy: player.strategy(),
            reinforcements: player.reinforcements,
            hand: player.hand().to_vec(),
            orders: player
                .orders()
                .map(|o| OrderRecord::capture(o, map))
                .collect(),
            truces: player.truces().iter().cloned().collect(),
            committed: player.is_committed(),
            eliminated_at: player.eliminated_at(),
        }
    }

    pub fn rebuild(&self, map: &Map) -> Result<Player> {
        let mut player = Player::new(&self.name, self.strategy);
        player.reinforcements = self.reinforcements;
        for card in &self.hand {
            player.add_card(*card);
        }
        for record in &self.orders {
            if record.owner != self.name {
                return Err(GameError::InvalidGame(format!(
                    "order of '{}' queued for '{}'",
                    record.owner, self.name
                )));
            }
            player.push_order(record.rebuild(map)?);
        }
        for other in &self.truces {
            player.add_truce(other);
        }
        player.set_committed(self.committed);
        player.restore_eliminated(self.eliminated_at);
        Ok(player)
    }
}

/// A whole saved game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub version: u32,
    pub phase: Phase,
    pub round: u32,
    pub max_turns: u32,
    pub current_player: usize,
    pub next_seq: u64,
    pub winner: Option<String>,
    pub map: MapRecord,
    pub players: Vec<PlayerRecord>,
    pub future_orders: Vec<OrderRecord>,
    pub active_truces: Vec<OrderRecord>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::InvalidGame(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: GameSnapshot =
            serde_json::from_str(text).map_err(|e| GameError::InvalidGame(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GameError::InvalidGame(format!(
                "unsupported save version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

/// Reports any failure while rebuilding a saved game as a corrupt save.
fn invalid(e: GameError) -> GameError {
    match e {
        GameError::InvalidGame(_) => e,
        other => GameError::InvalidGame(other.to_string()),
    }
}
