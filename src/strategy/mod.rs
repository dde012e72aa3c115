//! Player decision strategies.
//!
//! A strategy is asked for one decision at a time while its player is being
//! polled. It sees the board through a [`TurnContext`] and answers with a
//! [`Decision`]. The engine treats every strategy the same way and never
//! inspects which kind it is driving.

pub mod aggressive;
pub mod benevolent;
pub mod cheater;
pub mod human;
pub mod random;

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::board::{CardKind, CountryId, Map, OrderKind, Player};
use crate::engine::phase::Phase;
use crate::error::{GameError, Result};

pub use aggressive::Aggressive;
pub use benevolent::Benevolent;
pub use cheater::Cheater;
pub use human::Human;
pub use random::RandomStrategy;

/// The strategies a player can be driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyKind {
    Human,
    Aggressive,
    Benevolent,
    Random,
    Cheater,
}

/// Every strategy kind.
pub const ALL_STRATEGIES: [StrategyKind; 5] = [
    StrategyKind::Human,
    StrategyKind::Aggressive,
    StrategyKind::Benevolent,
    StrategyKind::Random,
    StrategyKind::Cheater,
];

impl StrategyKind {
    pub const fn name(self) -> &'static str {
        match self {
            StrategyKind::Human => "human",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::Benevolent => "benevolent",
            StrategyKind::Random => "random",
            StrategyKind::Cheater => "cheater",
        }
    }

    pub fn from_name(s: &str) -> Option<StrategyKind> {
        let lower = s.to_ascii_lowercase();
        ALL_STRATEGIES.into_iter().find(|k| k.name() == lower)
    }

    /// Returns true for strategies that decide without console input.
    pub const fn is_automatic(self) -> bool {
        !matches!(self, StrategyKind::Human)
    }

    /// Creates a fresh decision maker of this kind.
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Human => Box::new(Human),
            StrategyKind::Aggressive => Box::new(Aggressive::default()),
            StrategyKind::Benevolent => Box::new(Benevolent::default()),
            StrategyKind::Random => Box::new(RandomStrategy::default()),
            StrategyKind::Cheater => Box::new(Cheater::default()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        StrategyKind::from_name(s)
            .ok_or_else(|| GameError::InvalidArgument(format!("unknown strategy '{s}'")))
    }
}

/// A strategy's answer to one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Issue this order.
    Issue(OrderKind),
    /// Nothing more to issue this phase.
    Done,
    /// The player is driven from the console; wait for a command.
    AwaitInput,
}

/// Decides a player's orders.
pub trait Strategy: Send {
    fn kind(&self) -> StrategyKind;

    /// Produces the next decision for the polled player.
    fn decide(&mut self, ctx: &mut TurnContext<'_>) -> Decision;

    /// Called when the engine refused the last issued order.
    fn order_rejected(&mut self, _error: &GameError) {}
}

/// What a strategy may see and do while deciding.
pub struct TurnContext<'a> {
    map: &'a mut Map,
    player: &'a Player,
    opponents: &'a [String],
    phase: Phase,
    round: u32,
    rng: &'a mut SmallRng,
}

impl<'a> TurnContext<'a> {
    pub fn new(
        map: &'a mut Map,
        player: &'a Player,
        opponents: &'a [String],
        phase: Phase,
        round: u32,
        rng: &'a mut SmallRng,
    ) -> Self {
        TurnContext {
            map,
            player,
            opponents,
            phase,
            round,
            rng,
        }
    }

    pub fn map(&self) -> &Map {
        self.map
    }

    pub fn player(&self) -> &Player {
        self.player
    }

    pub fn name(&self) -> &str {
        self.player.name()
    }

    /// Names of the opponents still in the game.
    pub fn opponents(&self) -> &[String] {
        self.opponents
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        self.rng
    }

    /// Armies not yet committed to a deploy order.
    pub fn pool(&self) -> u32 {
        self.player.reinforcements
    }

    pub fn owned(&self) -> Vec<CountryId> {
        self.map.countries_owned_by(self.player.name())
    }

    /// Armies on an owned country once this round's deploys land.
    pub fn strength(&self, id: CountryId) -> u32 {
        let armies = self.map.country(id).map_or(0, |c| c.armies);
        armies.saturating_add(self.player.pending_deployments(id))
    }

    /// Cards of `kind` in hand that no pending order has claimed yet.
    pub fn spare_cards(&self, kind: CardKind) -> usize {
        let claimed = self
            .player
            .orders()
            .filter(|o| o.kind.card() == Some(kind))
            .count();
        self.player.card_count(kind).saturating_sub(claimed)
    }

    /// Returns true if `id` borders a country the player does not own.
    pub fn is_frontier(&self, id: CountryId) -> bool {
        self.map
            .enemy_neighbors_of(id, self.player.name())
            .is_ok_and(|n| !n.is_empty())
    }

    /// Returns true if the player may attack `id`: it is foreign and its
    /// owner is not at truce with the player.
    pub fn can_attack(&self, id: CountryId) -> bool {
        match self.map.country(id) {
            Ok(c) => match c.owner() {
                None => true,
                Some(owner) => {
                    owner != self.player.name() && !self.player.is_at_truce_with(owner)
                }
            },
            Err(_) => false,
        }
    }

    /// Neighbors of `id` the player may attack.
    pub fn attackable_neighbors(&self, id: CountryId) -> Vec<CountryId> {
        self.map
            .enemy_neighbors_of(id, self.player.name())
            .unwrap_or_default()
            .into_iter()
            .filter(|n| self.can_attack(*n))
            .collect()
    }

    /// Neighbors of `id` the player owns.
    pub fn own_neighbors(&self, id: CountryId) -> Vec<CountryId> {
        self.map
            .neighbors_of(id)
            .map(|set| {
                set.iter()
                    .copied()
                    .filter(|n| self.map.country(*n).is_ok_and(|c| c.is_owned_by(self.name())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The owned country with the most armies, lowest id on ties.
    pub fn strongest(&self, among: &[CountryId]) -> Option<CountryId> {
        among
            .iter()
            .copied()
            .min_by_key(|id| (std::cmp::Reverse(self.strength(*id)), *id))
    }

    /// The owned country with the fewest armies, lowest id on ties.
    pub fn weakest(&self, among: &[CountryId]) -> Option<CountryId> {
        among.iter().copied().min_by_key(|id| (self.strength(*id), *id))
    }

    /// Takes a country outright, bypassing combat. Countries owned by a
    /// truce partner cannot be taken.
    pub fn seize(&mut self, country: CountryId) -> Result<()> {
        if !self.can_attack(country) {
            return Err(GameError::InvalidArgument(format!(
                "{} cannot seize {}",
                self.player.name(),
                self.map.country_name(country)
            )));
        }
        let name = self.player.name().to_string();
        self.map.country_mut(country)?.owner = Some(name);
        Ok(())
    }

    /// Doubles the armies on an owned country, bypassing deployment.
    pub fn double_armies(&mut self, country: CountryId) -> Result<()> {
        let name = self.player.name().to_string();
        let c = self.map.country_mut(country)?;
        if !c.is_owned_by(&name) {
            return Err(GameError::InvalidArgument(format!(
                "{name} does not own {}",
                c.name()
            )));
        }
        c.armies = c.armies.saturating_mul(2);
        Ok(())
    }
}

/// Orders planned for one (round, phase), handed out one per poll.
#[derive(Debug, Default)]
pub(crate) struct Plan {
    key: Option<(u32, Phase)>,
    queue: VecDeque<OrderKind>,
}

impl Plan {
    pub(crate) fn is_for(&self, round: u32, phase: Phase) -> bool {
        self.key == Some((round, phase))
    }

    pub(crate) fn reset(&mut self, round: u32, phase: Phase, orders: Vec<OrderKind>) {
        self.key = Some((round, phase));
        self.queue = orders.into();
    }

    pub(crate) fn next(&mut self) -> Option<OrderKind> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for driving a strategy against a board without an engine.

    use super::*;
    use crate::board::Order;
    use rand::SeedableRng;

    pub(crate) struct Board {
        pub map: Map,
        pub player: Player,
        pub opponents: Vec<String>,
        pub rng: SmallRng,
        seq: u64,
    }

    impl Board {
        pub(crate) fn new(map: Map, player: Player, opponents: &[&str]) -> Self {
            Board {
                map,
                player,
                opponents: opponents.iter().map(|s| s.to_string()).collect(),
                rng: SmallRng::seed_from_u64(11),
                seq: 0,
            }
        }

        pub(crate) fn decide(
            &mut self,
            strategy: &mut dyn Strategy,
            phase: Phase,
            round: u32,
        ) -> Decision {
            let mut ctx = TurnContext::new(
                &mut self.map,
                &self.player,
                &self.opponents,
                phase,
                round,
                &mut self.rng,
            );
            strategy.decide(&mut ctx)
        }

        /// Polls until the strategy is done, recording accepted deploys the
        /// way the engine would.
        pub(crate) fn collect(
            &mut self,
            strategy: &mut dyn Strategy,
            phase: Phase,
            round: u32,
        ) -> Vec<OrderKind> {
            let mut out = Vec::new();
            for _ in 0..200 {
                match self.decide(strategy, phase, round) {
                    Decision::Issue(kind) => {
                        if let OrderKind::Deploy { armies, .. } = kind {
                            self.player.reinforcements -= armies;
                        }
                        let name = self.player.name().to_string();
                        self.player
                            .push_order(Order::new(&name, kind.clone(), round, self.seq));
                        self.seq += 1;
                        out.push(kind);
                    }
                    Decision::Done | Decision::AwaitInput => break,
                }
            }
            out
        }
    }
}
