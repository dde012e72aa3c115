//! Order types.
//!
//! An order is owned by the player who issued it and carries the round at
//! which it becomes eligible to execute. Every order executes in the round it
//! was issued except Negotiate, which is deferred one round and expires the
//! round after that.

use std::fmt;

use super::card::CardKind;
use super::map::{CountryId, Map};

/// What an order does. The command notation is given for each variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderKind {
    /// Deploy: `deploy <country> <armies>`
    Deploy { target: CountryId, armies: u32 },

    /// Advance: `advance <from> <to> <armies>`
    Advance {
        source: CountryId,
        target: CountryId,
        armies: u32,
    },

    /// Bomb: `bomb <country>`
    Bomb { target: CountryId },

    /// Blockade: `blockade <country>`
    Blockade { target: CountryId },

    /// Airlift: `airlift <from> <to> <armies>`
    Airlift {
        source: CountryId,
        target: CountryId,
        armies: u32,
    },

    /// Negotiate: `negotiate <player>`
    Negotiate { other: String },
}

impl OrderKind {
    /// The command keyword for this kind.
    pub const fn keyword(&self) -> &'static str {
        match self {
            OrderKind::Deploy { .. } => "deploy",
            OrderKind::Advance { .. } => "advance",
            OrderKind::Bomb { .. } => "bomb",
            OrderKind::Blockade { .. } => "blockade",
            OrderKind::Airlift { .. } => "airlift",
            OrderKind::Negotiate { .. } => "negotiate",
        }
    }

    /// The card this order spends, if any.
    pub const fn card(&self) -> Option<CardKind> {
        match self {
            OrderKind::Deploy { .. } | OrderKind::Advance { .. } => None,
            OrderKind::Bomb { .. } => Some(CardKind::Bomb),
            OrderKind::Blockade { .. } => Some(CardKind::Blockade),
            OrderKind::Airlift { .. } => Some(CardKind::Airlift),
            OrderKind::Negotiate { .. } => Some(CardKind::Diplomacy),
        }
    }

    /// Positional arguments in command notation, with country names
    /// resolved against `map`.
    pub fn arguments(&self, map: &Map) -> Vec<String> {
        match self {
            OrderKind::Deploy { target, armies } => {
                vec![map.country_name(*target), armies.to_string()]
            }
            OrderKind::Advance {
                source,
                target,
                armies,
            }
            | OrderKind::Airlift {
                source,
                target,
                armies,
            } => vec![
                map.country_name(*source),
                map.country_name(*target),
                armies.to_string(),
            ],
            OrderKind::Bomb { target } | OrderKind::Blockade { target } => {
                vec![map.country_name(*target)]
            }
            OrderKind::Negotiate { other } => vec![other.clone()],
        }
    }

    /// Renders the order in command notation.
    pub fn describe(&self, map: &Map) -> String {
        let mut parts = vec![self.keyword().to_string()];
        parts.extend(self.arguments(map));
        parts.join(" ")
    }
}

/// An issued order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    owner: String,
    seq: u64,
    execution_index: u32,
    expiry_index: Option<u32>,
    pub kind: OrderKind,
}

impl Order {
    /// Creates an order issued during `round`.
    ///
    /// `seq` is the engine-wide issue counter used to break ties between
    /// orders sharing an execution index.
    pub fn new(owner: &str, kind: OrderKind, round: u32, seq: u64) -> Self {
        let (execution_index, expiry_index) = match kind {
            OrderKind::Negotiate { .. } => (round + 1, Some(round + 2)),
            _ => (round, None),
        };
        Order {
            owner: owner.to_string(),
            seq,
            execution_index,
            expiry_index,
            kind,
        }
    }

    /// Rebuilds an order with its recorded scheduling. Used by persistence.
    pub(crate) fn restore(
        owner: &str,
        kind: OrderKind,
        seq: u64,
        execution_index: u32,
        expiry_index: Option<u32>,
    ) -> Self {
        Order {
            owner: owner.to_string(),
            seq,
            execution_index,
            expiry_index,
            kind,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The round at which the order becomes eligible to execute.
    pub fn execution_index(&self) -> u32 {
        self.execution_index
    }

    /// The round at whose start the order's effect is withdrawn.
    pub fn expiry_index(&self) -> Option<u32> {
        self.expiry_index
    }

    /// Returns true if the order is scheduled after the round it was issued in.
    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, OrderKind::Negotiate { .. })
    }

    /// Key giving the global execution order.
    pub fn sort_key(&self) -> (u32, u64) {
        (self.execution_index, self.seq)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} {} (round {})",
            self.owner,
            self.seq,
            self.kind.keyword(),
            self.execution_index
        )
    }
}
