//! Game phases and the commands each one accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::parser::CommandKind;

/// The phase the engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Building or editing the map.
    MapEditor,
    /// Map validated; players join and countries are assigned.
    Startup,
    /// Players place their reinforcement pool.
    Reinforcement,
    /// Players issue orders of every kind.
    IssueOrder,
    /// Orders execute in `(execution_index, issue sequence)` order.
    ExecuteOrder,
    /// Terminal: a winner was found or the turn limit was reached.
    GameOver,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Phase::MapEditor => "MapEditor",
            Phase::Startup => "Startup",
            Phase::Reinforcement => "Reinforcement",
            Phase::IssueOrder => "IssueOrder",
            Phase::ExecuteOrder => "ExecuteOrder",
            Phase::GameOver => "GameOver",
        }
    }

    /// Returns true if `command` is legal in this phase.
    pub fn allows(self, command: CommandKind) -> bool {
        use CommandKind::*;
        // quit is handled by the console, never by the engine
        match self {
            Phase::MapEditor => matches!(
                command,
                LoadMap
                    | EditMap
                    | EditContinent
                    | EditCountry
                    | EditNeighbor
                    | SaveMap
                    | ValidateMap
                    | ShowMap
                    | LoadGame
                    | Tournament
            ),
            Phase::Startup => matches!(
                command,
                GamePlayer | AssignCountries | ShowMap | SaveMap | LoadGame
            ),
            Phase::Reinforcement => matches!(command, Deploy | Commit | ShowMap | SaveGame),
            Phase::IssueOrder => matches!(
                command,
                Deploy
                    | Advance
                    | Bomb
                    | Blockade
                    | Airlift
                    | Negotiate
                    | Commit
                    | ShowMap
                    | SaveGame
            ),
            Phase::ExecuteOrder | Phase::GameOver => command == ShowMap,
        }
    }

    /// Returns true while rounds are being played.
    pub fn is_in_play(self) -> bool {
        matches!(
            self,
            Phase::Reinforcement | Phase::IssueOrder | Phase::ExecuteOrder
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
