//! Player state.
//!
//! A player holds a reinforcement pool, a hand of cards, the queue of orders
//! issued this round and the set of players it is at truce with. The
//! countries a player owns are read from the map.

use std::collections::{BTreeSet, VecDeque};

use super::card::{Card, CardKind};
use super::map::CountryId;
use super::order::{Order, OrderKind};
use crate::strategy::StrategyKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    name: String,
    strategy: StrategyKind,
    /// Armies not yet committed to a deploy order.
    pub reinforcements: u32,
    hand: Vec<Card>,
    orders: VecDeque<Order>,
    truces: BTreeSet<String>,
    committed: bool,
    eliminated_at: Option<u32>,
}

impl Player {
    pub fn new(name: &str, strategy: StrategyKind) -> Self {
        Player {
            name: name.to_string(),
            strategy,
            reinforcements: 0,
            hand: Vec::new(),
            orders: VecDeque::new(),
            truces: BTreeSet::new(),
            committed: false,
            eliminated_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn add_card(&mut self, card: Card) {
        self.hand.push(card);
    }

    pub fn card_count(&self, kind: CardKind) -> usize {
        self.hand.iter().filter(|c| c.kind() == kind).count()
    }

    /// Removes the oldest card of the given kind from the hand.
    pub fn take_card(&mut self, kind: CardKind) -> Option<Card> {
        let idx = self.hand.iter().position(|c| c.kind() == kind)?;
        Some(self.hand.remove(idx))
    }

    /// Orders issued but not yet executed, in issue order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn pending_order_count(&self) -> usize {
        self.orders.len()
    }

    pub(crate) fn push_order(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    pub(crate) fn drain_orders(&mut self) -> Vec<Order> {
        self.orders.drain(..).collect()
    }

    /// Armies already ordered onto `country` this round.
    pub fn pending_deployments(&self, country: CountryId) -> u32 {
        self.orders
            .iter()
            .map(|o| match o.kind {
                OrderKind::Deploy { target, armies } if target == country => armies,
                _ => 0,
            })
            .sum()
    }

    pub fn truces(&self) -> &BTreeSet<String> {
        &self.truces
    }

    pub fn is_at_truce_with(&self, other: &str) -> bool {
        self.truces.contains(other)
    }

    pub(crate) fn add_truce(&mut self, other: &str) {
        self.truces.insert(other.to_string());
    }

    pub(crate) fn remove_truce(&mut self, other: &str) {
        self.truces.remove(other);
    }

    pub(crate) fn clear_truces(&mut self) {
        self.truces.clear();
    }

    /// Whether the player has signalled completion for the current phase.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub(crate) fn set_committed(&mut self, committed: bool) {
        self.committed = committed;
    }

    pub fn eliminated_at(&self) -> Option<u32> {
        self.eliminated_at
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated_at.is_some()
    }

    pub(crate) fn mark_eliminated(&mut self, round: u32) {
        if self.eliminated_at.is_none() {
            self.eliminated_at = Some(round);
        }
    }

    pub(crate) fn restore_eliminated(&mut self, round: Option<u32>) {
        self.eliminated_at = round;
    }
}
