//! Round orchestration.
//!
//! A round is Reinforcement, IssueOrder and ExecuteOrder. During the two
//! issuing phases players are polled in turn: each poll yields at most one
//! order before the next player is asked, and a player that answers `Done`
//! is committed for the rest of the phase. Execution drains every queued
//! order plus every deferred order that has come due and runs them in
//! `(execution_index, issue sequence)` order.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::events::{EventKind, EventSink, GameEvent};
use super::phase::Phase;
use crate::board::{CardKind, CountryId, Map, Order, OrderKind, Player};
use crate::error::{GameError, Result};
use crate::resolve::{reinforcement_allotment, World};
use crate::strategy::{Decision, Strategy, StrategyKind, TurnContext};

/// Polls a single player may consume in one phase before being committed.
pub const MAX_POLLS_PER_PHASE: u32 = 256;

/// Game settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Rounds played before the game is declared a draw.
    pub max_turns: u32,
    /// Random seed (0 = use entropy).
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            max_turns: 50,
            seed: 0,
        }
    }
}

impl GameConfig {
    /// Creates the game RNG.
    pub fn rng(&self) -> SmallRng {
        if self.seed != 0 {
            SmallRng::seed_from_u64(self.seed)
        } else {
            SmallRng::from_entropy()
        }
    }
}

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A player issued an order, committed, or had an order rejected.
    Progress,
    /// The player at this index is driven from the console.
    AwaitInput(usize),
    /// Every active player has committed.
    PhaseComplete,
}

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEnd {
    Continue,
    Won(String),
    Draw,
}

/// Players, their strategies, and the round and order bookkeeping.
pub struct GamePlay {
    players: Vec<Player>,
    strategies: Vec<Box<dyn Strategy>>,
    polls: Vec<u32>,
    round: u32,
    current: usize,
    awaiting: Option<usize>,
    future_orders: BTreeMap<u32, Vec<Order>>,
    active_truces: Vec<Order>,
    next_seq: u64,
    max_turns: u32,
    rng: SmallRng,
    winner: Option<String>,
}

/// Scheduling state restored from a saved game.
pub(crate) struct Schedule {
    pub round: u32,
    pub current: usize,
    pub next_seq: u64,
    pub max_turns: u32,
    pub future_orders: Vec<Order>,
    pub active_truces: Vec<Order>,
    pub winner: Option<String>,
}

impl GamePlay {
    pub fn new(config: &GameConfig) -> Self {
        GamePlay {
            players: Vec::new(),
            strategies: Vec::new(),
            polls: Vec::new(),
            round: 0,
            current: 0,
            awaiting: None,
            future_orders: BTreeMap::new(),
            active_truces: Vec::new(),
            next_seq: 0,
            max_turns: config.max_turns,
            rng: config.rng(),
            winner: None,
        }
    }

    /// Rebuilds a game from saved players and schedule.
    pub(crate) fn restore(players: Vec<Player>, schedule: Schedule, rng: SmallRng) -> Self {
        let strategies = players.iter().map(|p| p.strategy().build()).collect();
        let polls = vec![0; players.len()];
        let mut future_orders: BTreeMap<u32, Vec<Order>> = BTreeMap::new();
        for order in schedule.future_orders {
            future_orders
                .entry(order.execution_index())
                .or_default()
                .push(order);
        }
        GamePlay {
            current: schedule.current.min(players.len().saturating_sub(1)),
            players,
            strategies,
            polls,
            round: schedule.round,
            awaiting: None,
            future_orders,
            active_truces: schedule.active_truces,
            next_seq: schedule.next_seq,
            max_turns: schedule.max_turns,
            rng,
            winner: schedule.winner,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| GameError::not_found("player", name))
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.players
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| GameError::not_found("player", name))
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// The console-driven player the engine is waiting on, if any.
    pub fn awaiting(&self) -> Option<&Player> {
        self.awaiting.and_then(|idx| self.players.get(idx))
    }

    /// Deferred orders not yet executed, by execution round.
    pub fn future_orders(&self) -> impl Iterator<Item = &Order> {
        self.future_orders.values().flatten()
    }

    /// Executed orders whose effect is still in force.
    pub fn active_truces(&self) -> &[Order] {
        &self.active_truces
    }

    pub fn add_player(&mut self, name: &str, strategy: StrategyKind) -> Result<()> {
        if name.is_empty() {
            return Err(GameError::InvalidArgument("player name is empty".to_string()));
        }
        if self.players.iter().any(|p| p.name() == name) {
            return Err(GameError::InvalidArgument(format!(
                "player '{name}' already exists"
            )));
        }
        self.players.push(Player::new(name, strategy));
        self.strategies.push(strategy.build());
        self.polls.push(0);
        Ok(())
    }

    pub fn remove_player(&mut self, name: &str) -> Result<()> {
        let idx = self.index_of(name)?;
        self.players.remove(idx);
        self.strategies.remove(idx);
        self.polls.remove(idx);
        Ok(())
    }

    /// Deals the countries out round-robin in random order, one army each,
    /// and opens round 1.
    pub fn assign_countries(&mut self, map: &mut Map) -> Result<()> {
        if self.players.len() < 2 {
            return Err(GameError::InvalidArgument(
                "at least two players are needed".to_string(),
            ));
        }
        if map.country_count() < self.players.len() {
            return Err(GameError::InvalidArgument(format!(
                "{} countries cannot be shared among {} players",
                map.country_count(),
                self.players.len()
            )));
        }
        let mut ids: Vec<CountryId> = map.countries().map(|c| c.id()).collect();
        ids.shuffle(&mut self.rng);
        for (i, id) in ids.into_iter().enumerate() {
            let owner = self.players[i % self.players.len()].name().to_string();
            let country = map.country_mut(id)?;
            country.owner = Some(owner);
            country.armies = 1;
        }
        self.round = 1;
        self.winner = None;
        self.top_up(map);
        Ok(())
    }

    /// Adds each active player's allotment to its pool.
    fn top_up(&mut self, map: &Map) {
        for player in self.players.iter_mut().filter(|p| !p.is_eliminated()) {
            let allotment = reinforcement_allotment(map, player.name());
            player.reinforcements = player.reinforcements.saturating_add(allotment);
            debug!(
                "{} receives {allotment} armies ({} in pool)",
                player.name(),
                player.reinforcements
            );
        }
    }

    /// Clears commit flags and poll counters for a new issuing phase.
    pub fn begin_phase(&mut self) {
        for player in &mut self.players {
            player.set_committed(false);
        }
        self.polls.iter_mut().for_each(|p| *p = 0);
        self.current = 0;
        self.awaiting = None;
    }

    fn opponents(&self, idx: usize) -> Vec<String> {
        self.players
            .iter()
            .enumerate()
            .filter(|(i, p)| *i != idx && !p.is_eliminated())
            .map(|(_, p)| p.name().to_string())
            .collect()
    }

    /// Cards of `kind` held by the player at `idx` that no pending or
    /// deferred order has claimed.
    fn spare_cards(&self, idx: usize, kind: CardKind) -> usize {
        let player = &self.players[idx];
        let queued = player
            .orders()
            .filter(|o| o.kind.card() == Some(kind))
            .count();
        let deferred = self
            .future_orders()
            .filter(|o| o.owner() == player.name() && o.kind.card() == Some(kind))
            .count();
        player.card_count(kind).saturating_sub(queued + deferred)
    }

    fn validate(&self, map: &Map, idx: usize, kind: &OrderKind, phase: Phase) -> Result<()> {
        let player = &self.players[idx];
        let name = player.name();
        match phase {
            Phase::IssueOrder => {}
            Phase::Reinforcement if matches!(kind, OrderKind::Deploy { .. }) => {}
            _ => {
                return Err(GameError::InvalidCommand(format!(
                    "{} orders are not accepted during {phase}",
                    kind.keyword()
                )))
            }
        }
        if player.is_eliminated() || player.is_committed() {
            return Err(GameError::InvalidCommand(format!(
                "{name} cannot issue orders now"
            )));
        }

        let owned = |id: CountryId| -> Result<()> {
            let country = map.country(id)?;
            if country.is_owned_by(name) {
                Ok(())
            } else {
                Err(GameError::InvalidArgument(format!(
                    "{name} does not own {}",
                    country.name()
                )))
            }
        };
        let positive = |armies: u32| -> Result<()> {
            if armies == 0 {
                Err(GameError::InvalidArgument(
                    "army count must be positive".to_string(),
                ))
            } else {
                Ok(())
            }
        };

        match kind {
            OrderKind::Deploy { target, armies } => {
                owned(*target)?;
                positive(*armies)?;
                if *armies > player.reinforcements {
                    return Err(GameError::InvalidArgument(format!(
                        "{name} has only {} armies in the pool",
                        player.reinforcements
                    )));
                }
            }
            OrderKind::Advance {
                source,
                target,
                armies,
            } => {
                owned(*source)?;
                map.country(*target)?;
                positive(*armies)?;
                if !map.is_adjacent(*source, *target) {
                    return Err(GameError::InvalidArgument(format!(
                        "{} does not border {}",
                        map.country_name(*source),
                        map.country_name(*target)
                    )));
                }
            }
            OrderKind::Bomb { target } => {
                let country = map.country(*target)?;
                if country.is_owned_by(name) {
                    return Err(GameError::InvalidArgument(format!(
                        "{name} cannot bomb its own country {}",
                        country.name()
                    )));
                }
                let bordered = country
                    .neighbors()
                    .iter()
                    .any(|n| map.country(*n).is_ok_and(|c| c.is_owned_by(name)));
                if !bordered {
                    return Err(GameError::InvalidArgument(format!(
                        "{} does not border any country of {name}",
                        country.name()
                    )));
                }
            }
            OrderKind::Blockade { target } => owned(*target)?,
            OrderKind::Airlift {
                source,
                target,
                armies,
            } => {
                owned(*source)?;
                owned(*target)?;
                positive(*armies)?;
                if source == target {
                    return Err(GameError::InvalidArgument(
                        "airlift needs two different countries".to_string(),
                    ));
                }
            }
            OrderKind::Negotiate { other } => {
                if other == name {
                    return Err(GameError::InvalidArgument(format!(
                        "{name} cannot negotiate with itself"
                    )));
                }
                if self.player(other)?.is_eliminated() {
                    return Err(GameError::InvalidArgument(format!(
                        "{other} is out of the game"
                    )));
                }
            }
        }

        if let Some(card) = kind.card() {
            if self.spare_cards(idx, card) == 0 {
                return Err(GameError::CardNotFound {
                    player: name.to_string(),
                    card,
                });
            }
        }
        Ok(())
    }

    /// Validates and queues an order for the player at `idx`. Deploys
    /// reserve their armies from the pool; deferred orders go to the
    /// future-order queue. Nothing changes when validation fails.
    pub fn issue(
        &mut self,
        map: &Map,
        idx: usize,
        kind: OrderKind,
        phase: Phase,
        sink: &mut dyn EventSink,
    ) -> Result<Order> {
        if idx >= self.players.len() {
            return Err(GameError::not_found("player", idx.to_string()));
        }
        self.validate(map, idx, &kind, phase)?;

        let player = &mut self.players[idx];
        let order = Order::new(player.name(), kind, self.round, self.next_seq);
        self.next_seq += 1;
        if let OrderKind::Deploy { armies, .. } = order.kind {
            player.reinforcements -= armies;
        }
        sink.emit(&GameEvent::new(
            EventKind::OrderIssued,
            format!("{} issued {}", player.name(), order.kind.describe(map)),
        ));
        if order.is_deferred() {
            self.future_orders
                .entry(order.execution_index())
                .or_default()
                .push(order.clone());
        } else {
            player.push_order(order.clone());
        }
        Ok(order)
    }

    /// Issues an order for the console player the engine is waiting on.
    pub fn issue_for_awaiting(
        &mut self,
        map: &Map,
        kind: OrderKind,
        phase: Phase,
        sink: &mut dyn EventSink,
    ) -> Result<Order> {
        let idx = self.awaiting_index()?;
        let order = self.issue(map, idx, kind, phase, sink)?;
        self.advance_cursor(idx);
        Ok(order)
    }

    /// Commits the console player the engine is waiting on.
    pub fn commit_awaiting(&mut self) -> Result<String> {
        let idx = self.awaiting_index()?;
        self.commit(idx);
        self.advance_cursor(idx);
        Ok(self.players[idx].name().to_string())
    }

    fn awaiting_index(&self) -> Result<usize> {
        self.awaiting.ok_or_else(|| {
            GameError::InvalidCommand("no player is waiting for console input".to_string())
        })
    }

    fn commit(&mut self, idx: usize) {
        self.players[idx].set_committed(true);
    }

    fn advance_cursor(&mut self, idx: usize) {
        self.awaiting = None;
        self.current = (idx + 1) % self.players.len().max(1);
    }

    /// Polls the next uncommitted player once.
    pub fn poll(&mut self, map: &mut Map, phase: Phase, sink: &mut dyn EventSink) -> Poll {
        let n = self.players.len();
        for step in 0..n {
            let idx = (self.current + step) % n;
            let player = &self.players[idx];
            if player.is_committed() || player.is_eliminated() {
                continue;
            }
            self.current = idx;
            if self.polls[idx] >= MAX_POLLS_PER_PHASE {
                warn!(
                    "{} used {MAX_POLLS_PER_PHASE} polls in {phase}; committing",
                    player.name()
                );
                self.commit(idx);
                self.advance_cursor(idx);
                return Poll::Progress;
            }

            let opponents = self.opponents(idx);
            let decision = {
                let mut ctx = TurnContext::new(
                    map,
                    &self.players[idx],
                    &opponents,
                    phase,
                    self.round,
                    &mut self.rng,
                );
                self.strategies[idx].decide(&mut ctx)
            };
            match decision {
                Decision::AwaitInput => {
                    self.awaiting = Some(idx);
                    return Poll::AwaitInput(idx);
                }
                Decision::Done => {
                    debug!("{} is done with {phase}", self.players[idx].name());
                    self.commit(idx);
                }
                Decision::Issue(kind) => {
                    self.polls[idx] += 1;
                    if let Err(e) = self.issue(map, idx, kind, phase, sink) {
                        warn!("order from {} rejected: {e}", self.players[idx].name());
                        self.strategies[idx].order_rejected(&e);
                    }
                }
            }
            self.advance_cursor(idx);
            return Poll::Progress;
        }
        self.awaiting = None;
        Poll::PhaseComplete
    }

    /// Executes every order due this round.
    pub fn execute_orders(&mut self, map: &mut Map, sink: &mut dyn EventSink) {
        let mut due: Vec<Order> = self
            .players
            .iter_mut()
            .flat_map(|p| p.drain_orders())
            .collect();
        let later = self.future_orders.split_off(&(self.round + 1));
        let ready = std::mem::replace(&mut self.future_orders, later);
        due.extend(ready.into_values().flatten());
        due.sort_by_key(Order::sort_key);

        for order in due {
            let mut world = World {
                map: &mut *map,
                players: &mut self.players,
                rng: &mut self.rng,
                round: self.round,
            };
            match order.execute(&mut world) {
                Ok(message) => {
                    debug!("round {}: {message}", self.round);
                    sink.emit(&GameEvent::new(EventKind::OrderExecuted, message));
                    if order.expiry_index().is_some() {
                        self.active_truces.push(order);
                    }
                }
                Err(e) => {
                    warn!("round {}: {order} failed: {e}", self.round);
                    sink.emit(&GameEvent::new(
                        EventKind::OrderExecuted,
                        format!("{} failed: {e}", order.kind.describe(map)),
                    ));
                }
            }
        }
    }

    /// Closes the round: records eliminations, detects a winner or the turn
    /// limit, and otherwise opens the next round.
    pub fn end_round(&mut self, map: &mut Map, sink: &mut dyn EventSink) -> RoundEnd {
        for player in self.players.iter_mut().filter(|p| !p.is_eliminated()) {
            if map.owned_count(player.name()) == 0 {
                player.mark_eliminated(self.round);
                info!("{} eliminated in round {}", player.name(), self.round);
                sink.emit(&GameEvent::new(
                    EventKind::PlayerEliminated,
                    format!("{} eliminated in round {}", player.name(), self.round),
                ));
            }
        }

        if let Some(owner) = map.sole_owner() {
            let owner = owner.to_string();
            self.winner = Some(owner.clone());
            return RoundEnd::Won(owner);
        }
        if self.round >= self.max_turns {
            return RoundEnd::Draw;
        }

        self.round += 1;
        self.expire_truces(map, sink);
        self.top_up(map);
        sink.emit(&GameEvent::new(
            EventKind::TurnCompleted,
            format!("round {} begins", self.round),
        ));
        RoundEnd::Continue
    }

    /// Lifts every truce whose expiry round has been reached.
    fn expire_truces(&mut self, map: &mut Map, sink: &mut dyn EventSink) {
        let round = self.round;
        let (expired, kept): (Vec<Order>, Vec<Order>) = std::mem::take(&mut self.active_truces)
            .into_iter()
            .partition(|o| o.expiry_index().is_some_and(|e| e <= round));
        self.active_truces = kept;
        for order in expired {
            let mut world = World {
                map: &mut *map,
                players: &mut self.players,
                rng: &mut self.rng,
                round,
            };
            let message = order.expire(&mut world, true);
            sink.emit(&GameEvent::new(EventKind::OrderExpired, message));
        }
    }

    /// Ends the game early: expires every pending and deferred order and
    /// lifts every truce.
    pub fn cancel(&mut self, map: &mut Map, sink: &mut dyn EventSink) {
        let mut pending: Vec<Order> = self
            .players
            .iter_mut()
            .flat_map(|p| p.drain_orders())
            .collect();
        pending.extend(std::mem::take(&mut self.future_orders).into_values().flatten());
        pending.sort_by_key(Order::sort_key);
        let fired = std::mem::take(&mut self.active_truces);

        let round = self.round;
        let mut world = World {
            map,
            players: &mut self.players,
            rng: &mut self.rng,
            round,
        };
        for order in pending {
            let message = order.expire(&mut world, false);
            sink.emit(&GameEvent::new(EventKind::OrderExpired, message));
        }
        for order in fired {
            let message = order.expire(&mut world, true);
            sink.emit(&GameEvent::new(EventKind::OrderExpired, message));
        }
        for player in &mut self.players {
            player.clear_truces();
            player.set_committed(false);
        }
        self.awaiting = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::split_map;
    use crate::board::Card;
    use crate::engine::events::{MemorySink, NullSink};

    fn seeded() -> GameConfig {
        GameConfig {
            max_turns: 10,
            seed: 42,
        }
    }

    /// alice and bob, both console-driven, on the split twin map.
    fn humans(armies: u32) -> (GamePlay, Map) {
        let mut gp = GamePlay::new(&seeded());
        gp.add_player("alice", StrategyKind::Human).unwrap();
        gp.add_player("bob", StrategyKind::Human).unwrap();
        gp.round = 1;
        (gp, split_map(armies))
    }

    #[test]
    fn duplicate_players_rejected() {
        let (mut gp, _) = humans(1);
        assert!(gp.add_player("alice", StrategyKind::Random).is_err());
        assert!(gp.add_player("", StrategyKind::Random).is_err());
        gp.remove_player("alice").unwrap();
        assert!(gp.remove_player("alice").is_err());
        assert_eq!(gp.players().len(), 1);
    }

    #[test]
    fn assignment_gives_everyone_countries() {
        let mut gp = GamePlay::new(&seeded());
        let mut map = crate::board::fixtures::twin_map();
        gp.add_player("a", StrategyKind::Random).unwrap();
        assert!(gp.assign_countries(&mut map).is_err(), "one player");
        gp.add_player("b", StrategyKind::Random).unwrap();
        gp.add_player("c", StrategyKind::Random).unwrap();
        gp.assign_countries(&mut map).unwrap();
        for name in ["a", "b", "c"] {
            assert_eq!(map.owned_count(name), 2);
            assert_eq!(gp.player(name).unwrap().reinforcements, 3);
        }
        assert!(map.countries().all(|c| c.armies == 1));
        assert_eq!(gp.round(), 1);
    }

    #[test]
    fn too_few_countries_rejected() {
        let mut gp = GamePlay::new(&seeded());
        let mut map = Map::new();
        map.add_continent("Tiny", 1).unwrap();
        map.add_country_to_continent("only", "Tiny").unwrap();
        gp.add_player("a", StrategyKind::Random).unwrap();
        gp.add_player("b", StrategyKind::Random).unwrap();
        assert!(matches!(
            gp.assign_countries(&mut map),
            Err(GameError::InvalidArgument(_))
        ));
        assert_eq!(map.country(1).unwrap().owner(), None);
    }

    #[test]
    fn pools_saturate_on_huge_bonuses() {
        let mut gp = GamePlay::new(&seeded());
        let mut map = Map::new();
        map.add_continent("East", u32::MAX).unwrap();
        map.add_continent("West", u32::MAX).unwrap();
        map.add_country_to_continent("e", "East").unwrap();
        map.add_country_to_continent("w", "West").unwrap();
        map.add_neighbor("e", "w").unwrap();
        gp.add_player("a", StrategyKind::Human).unwrap();
        gp.add_player("b", StrategyKind::Human).unwrap();
        gp.assign_countries(&mut map).unwrap();
        assert!(gp.players().iter().all(|p| p.reinforcements == u32::MAX));

        assert_eq!(gp.end_round(&mut map, &mut NullSink), RoundEnd::Continue);
        assert!(gp.players().iter().all(|p| p.reinforcements == u32::MAX));
    }

    #[test]
    fn deploy_reserves_pool_and_rejects_overdraw() {
        let (mut gp, map) = humans(1);
        gp.players[0].reinforcements = 5;
        let mut sink = NullSink;
        gp.issue(&map, 0, OrderKind::Deploy { target: 1, armies: 3 }, Phase::Reinforcement, &mut sink)
            .unwrap();
        assert_eq!(gp.players[0].reinforcements, 2);
        let err = gp
            .issue(&map, 0, OrderKind::Deploy { target: 2, armies: 3 }, Phase::Reinforcement, &mut sink)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidArgument(_)));
        assert_eq!(gp.players[0].reinforcements, 2);
        assert_eq!(gp.players[0].pending_order_count(), 1);
    }

    #[test]
    fn reinforcement_accepts_only_deploys() {
        let (mut gp, map) = humans(3);
        let err = gp
            .issue(
                &map,
                0,
                OrderKind::Advance {
                    source: 1,
                    target: 2,
                    armies: 1,
                },
                Phase::Reinforcement,
                &mut NullSink,
            )
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidCommand(_)));
    }

    #[test]
    fn issue_time_checks() {
        let (mut gp, map) = humans(3);
        let mut sink = NullSink;
        let mut try_issue = |kind| gp.issue(&map, 0, kind, Phase::IssueOrder, &mut sink);

        // foreign deploy target
        assert!(try_issue(OrderKind::Deploy { target: 4, armies: 1 }).is_err());
        // not adjacent
        assert!(try_issue(OrderKind::Advance {
            source: 1,
            target: 4,
            armies: 1
        })
        .is_err());
        // no card
        assert!(matches!(
            try_issue(OrderKind::Bomb { target: 4 }),
            Err(GameError::CardNotFound { .. })
        ));
        // unknown partner
        assert!(matches!(
            try_issue(OrderKind::Negotiate {
                other: "zed".to_string()
            }),
            Err(GameError::EntityNotFound { .. })
        ));
        assert!(try_issue(OrderKind::Negotiate {
            other: "alice".to_string()
        })
        .is_err());
        assert!(try_issue(OrderKind::Advance {
            source: 3,
            target: 4,
            armies: 2
        })
        .is_ok());
    }

    #[test]
    fn one_card_backs_one_order() {
        let (mut gp, map) = humans(3);
        gp.players[0].add_card(Card::new(CardKind::Bomb, 1));
        let mut sink = NullSink;
        gp.issue(&map, 0, OrderKind::Bomb { target: 4 }, Phase::IssueOrder, &mut sink)
            .unwrap();
        let err = gp
            .issue(&map, 0, OrderKind::Bomb { target: 6 }, Phase::IssueOrder, &mut sink)
            .unwrap_err();
        assert!(matches!(err, GameError::CardNotFound { card: CardKind::Bomb, .. }));
    }

    #[test]
    fn execution_follows_issue_sequence() {
        let (mut gp, mut map) = humans(4);
        let mut sink = MemorySink::new();
        // bob reinforces D after alice's attack was issued; the attack runs first.
        gp.issue(
            &map,
            0,
            OrderKind::Advance {
                source: 3,
                target: 4,
                armies: 4,
            },
            Phase::IssueOrder,
            &mut sink,
        )
        .unwrap();
        gp.players[1].reinforcements = 10;
        gp.issue(&map, 1, OrderKind::Deploy { target: 4, armies: 10 }, Phase::IssueOrder, &mut sink)
            .unwrap();
        gp.execute_orders(&mut map, &mut sink);

        // 4 v 4: defender loses 2, attacker loses 2; then +10
        assert_eq!(map.country(4).unwrap().owner(), Some("bob"));
        assert_eq!(map.country(4).unwrap().armies, 12);
        assert_eq!(map.country(3).unwrap().armies, 2);
        assert_eq!(sink.count(EventKind::OrderExecuted), 2);
    }

    #[test]
    fn negotiate_is_active_only_the_following_round() {
        let (mut gp, mut map) = humans(5);
        gp.players[0].add_card(Card::new(CardKind::Diplomacy, 1));
        let mut sink = NullSink;
        let order = gp
            .issue(
                &map,
                0,
                OrderKind::Negotiate {
                    other: "bob".to_string(),
                },
                Phase::IssueOrder,
                &mut sink,
            )
            .unwrap();
        assert_eq!(order.execution_index(), 2);
        assert_eq!(gp.future_orders().count(), 1);

        // round 1: not yet in force
        gp.execute_orders(&mut map, &mut sink);
        assert!(!gp.players[0].is_at_truce_with("bob"));
        assert_eq!(gp.end_round(&mut map, &mut sink), RoundEnd::Continue);

        // round 2: in force for the whole execution
        gp.execute_orders(&mut map, &mut sink);
        assert!(gp.players[0].is_at_truce_with("bob"));
        assert!(gp.players[1].is_at_truce_with("alice"));
        assert_eq!(gp.players[0].card_count(CardKind::Diplomacy), 0);
        assert_eq!(gp.end_round(&mut map, &mut sink), RoundEnd::Continue);

        // round 3: lifted
        assert!(!gp.players[0].is_at_truce_with("bob"));
        assert!(!gp.players[1].is_at_truce_with("alice"));
        assert!(gp.active_truces().is_empty());
    }

    #[test]
    fn turn_limit_ends_in_draw() {
        let (mut gp, mut map) = humans(1);
        gp.round = 10;
        assert_eq!(gp.end_round(&mut map, &mut NullSink), RoundEnd::Draw);
        assert_eq!(gp.winner(), None);
    }

    #[test]
    fn sole_owner_wins_and_loser_is_eliminated() {
        let (mut gp, mut map) = humans(1);
        for id in 4..=6 {
            map.country_mut(id).unwrap().owner = Some("alice".to_string());
        }
        let mut sink = MemorySink::new();
        assert_eq!(
            gp.end_round(&mut map, &mut sink),
            RoundEnd::Won("alice".to_string())
        );
        assert_eq!(gp.winner(), Some("alice"));
        assert_eq!(gp.players[1].eliminated_at(), Some(1));
        assert_eq!(sink.count(EventKind::PlayerEliminated), 1);
    }

    #[test]
    fn cancel_expires_deferred_orders_and_lifts_truces() {
        let (mut gp, mut map) = humans(1);
        gp.players[0].add_card(Card::new(CardKind::Diplomacy, 1));
        gp.players[1].add_truce("alice");
        gp.players[0].add_truce("bob");
        let mut sink = MemorySink::new();
        gp.issue(
            &map,
            0,
            OrderKind::Negotiate {
                other: "bob".to_string(),
            },
            Phase::IssueOrder,
            &mut sink,
        )
        .unwrap();
        gp.cancel(&mut map, &mut sink);
        assert_eq!(gp.future_orders().count(), 0);
        assert_eq!(gp.players[0].card_count(CardKind::Diplomacy), 0);
        assert!(gp.players.iter().all(|p| p.truces().is_empty()));
        assert_eq!(sink.count(EventKind::OrderExpired), 1);
    }

    #[test]
    fn polling_alternates_between_players() {
        let mut gp = GamePlay::new(&seeded());
        gp.add_player("alice", StrategyKind::Benevolent).unwrap();
        gp.add_player("bob", StrategyKind::Benevolent).unwrap();
        let mut map = split_map(1);
        gp.round = 1;
        gp.players[0].reinforcements = 2;
        gp.players[1].reinforcements = 2;
        gp.begin_phase();

        let sink = MemorySink::new();
        let mut writer = sink.clone();
        while gp.poll(&mut map, Phase::Reinforcement, &mut writer) != Poll::PhaseComplete {}
        let owners: Vec<String> = sink
            .events()
            .into_iter()
            .map(|e| e.message.split_whitespace().next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(owners, vec!["alice", "bob", "alice", "bob"]);
        assert!(gp.players.iter().all(|p| p.is_committed()));
    }

    #[test]
    fn console_player_blocks_polling() {
        let (mut gp, mut map) = humans(1);
        gp.players[0].reinforcements = 3;
        gp.begin_phase();
        let mut sink = NullSink;
        assert_eq!(gp.poll(&mut map, Phase::Reinforcement, &mut sink), Poll::AwaitInput(0));
        assert_eq!(gp.awaiting().map(Player::name), Some("alice"));

        gp.issue_for_awaiting(&map, OrderKind::Deploy { target: 1, armies: 3 }, Phase::Reinforcement, &mut sink)
            .unwrap();
        assert_eq!(gp.poll(&mut map, Phase::Reinforcement, &mut sink), Poll::AwaitInput(1));
        assert_eq!(gp.commit_awaiting().unwrap(), "bob");
        assert_eq!(gp.poll(&mut map, Phase::Reinforcement, &mut sink), Poll::AwaitInput(0));
        gp.commit_awaiting().unwrap();
        assert_eq!(gp.poll(&mut map, Phase::Reinforcement, &mut sink), Poll::PhaseComplete);
        assert!(gp.commit_awaiting().is_err());
    }
}
