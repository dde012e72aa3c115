//! The game engine.
//!
//! [`GameEngine`] ties the map editor, the round orchestration and the phase
//! machine together behind one command entry point. Every command is checked
//! against the current phase before anything is touched. After an accepted
//! command the engine keeps polling automatic players until a console player
//! has to act or the game is over.

pub mod editor;
pub mod events;
pub mod gameplay;
pub mod phase;

use std::fs;
use std::path::Path;

use log::info;

use crate::board::{Map, Player};
use crate::error::{GameError, Result};
use crate::protocol::mapper::order_from_command;
use crate::protocol::parser::{Command, CommandKind};
use crate::protocol::snapshot::{
    GameSnapshot, MapRecord, OrderRecord, PlayerRecord, SNAPSHOT_VERSION,
};
use crate::strategy::StrategyKind;
use crate::tournament::{run_tournament, TournamentConfig};

pub use editor::MapEditor;
pub use events::{EventKind, EventSink, GameEvent, LogSink, MemorySink, NullSink, WriterSink};
pub use gameplay::{GameConfig, GamePlay, Poll, RoundEnd};
pub use phase::Phase;

use gameplay::Schedule;

/// One game: its map, players and phase.
pub struct GameEngine {
    phase: Phase,
    editor: MapEditor,
    gameplay: GamePlay,
    config: GameConfig,
    events: Box<dyn EventSink>,
}

impl GameEngine {
    /// Creates an engine that reports events through `log`.
    pub fn new(config: GameConfig) -> Self {
        Self::with_sink(config, Box::new(LogSink))
    }

    pub fn with_sink(config: GameConfig, events: Box<dyn EventSink>) -> Self {
        GameEngine {
            phase: Phase::MapEditor,
            editor: MapEditor::new(),
            gameplay: GamePlay::new(&config),
            config,
            events,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn map(&self) -> &Map {
        self.editor.map()
    }

    pub fn gameplay(&self) -> &GamePlay {
        &self.gameplay
    }

    pub fn players(&self) -> &[Player] {
        self.gameplay.players()
    }

    pub fn round(&self) -> u32 {
        self.gameplay.round()
    }

    pub fn winner(&self) -> Option<&str> {
        self.gameplay.winner()
    }

    /// Name of the console player whose input the engine is waiting for.
    pub fn awaiting_player(&self) -> Option<&str> {
        self.gameplay.awaiting().map(Player::name)
    }

    fn emit(&mut self, kind: EventKind, message: impl Into<String>) {
        self.events.emit(&GameEvent::new(kind, message));
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        if matches!(phase, Phase::Reinforcement | Phase::IssueOrder) {
            self.gameplay.begin_phase();
        }
        let message = format!("{phase} (round {})", self.gameplay.round());
        self.emit(EventKind::PhaseChanged, message);
    }

    /// Runs one command and returns its result message.
    ///
    /// Commands not accepted in the current phase fail with
    /// `InvalidCommand` and change nothing.
    pub fn execute_command(&mut self, command: &Command) -> Result<String> {
        if !self.phase.allows(command.kind) {
            return Err(GameError::InvalidCommand(format!(
                "{} is not available during {}",
                command.kind, self.phase
            )));
        }
        match command.kind {
            CommandKind::LoadMap => self.load_map(Path::new(command.arg(0)?)),
            CommandKind::EditMap => {
                let path = Path::new(command.arg(0)?);
                let existed = self.editor.open(path)?;
                Ok(if existed {
                    format!("editing {}", path.display())
                } else {
                    format!("creating new map {}", path.display())
                })
            }
            CommandKind::EditContinent | CommandKind::EditCountry | CommandKind::EditNeighbor => {
                self.editor.apply(command)
            }
            CommandKind::SaveMap => self.save_map(Path::new(command.arg(0)?)),
            CommandKind::ValidateMap => self.validate_map(),
            CommandKind::ShowMap => Ok(self.show_map()),
            CommandKind::GamePlayer => self.edit_players(command),
            CommandKind::AssignCountries => self.assign_countries(),
            CommandKind::Deploy
            | CommandKind::Advance
            | CommandKind::Bomb
            | CommandKind::Blockade
            | CommandKind::Airlift
            | CommandKind::Negotiate => {
                let kind = order_from_command(command, self.editor.map())?;
                let order = self.gameplay.issue_for_awaiting(
                    self.editor.map(),
                    kind,
                    self.phase,
                    self.events.as_mut(),
                )?;
                let issued = format!(
                    "{} issued {}",
                    order.owner(),
                    order.kind.describe(self.editor.map())
                );
                Ok(format!("{issued}\n{}", self.drive()))
            }
            CommandKind::Commit => {
                let name = self.gameplay.commit_awaiting()?;
                Ok(format!("{name} committed\n{}", self.drive()))
            }
            CommandKind::SaveGame => self.save_game(Path::new(command.arg(0)?)),
            CommandKind::LoadGame => self.load_game(Path::new(command.arg(0)?)),
            CommandKind::Tournament => {
                let config = TournamentConfig::from_command(command)?;
                Ok(run_tournament(&config)?.render())
            }
            CommandKind::Quit => Err(GameError::InvalidCommand(
                "quit is handled by the console".to_string(),
            )),
        }
    }

    /// Loads and validates a map file, then opens player setup.
    pub fn load_map(&mut self, path: &Path) -> Result<String> {
        let map = MapEditor::read(path)?;
        map.validate()?;
        self.editor.replace(map, Some(path));
        let message = format!(
            "loaded {} ({} countries)",
            path.display(),
            self.editor.map().country_count()
        );
        self.emit(EventKind::MapLoaded, message.clone());
        self.set_phase(Phase::Startup);
        Ok(message)
    }

    /// Validates the map being edited and opens player setup.
    pub fn validate_map(&mut self) -> Result<String> {
        self.editor.map().validate()?;
        self.set_phase(Phase::Startup);
        Ok("map is valid".to_string())
    }

    pub fn save_map(&mut self, path: &Path) -> Result<String> {
        self.editor.save(path)?;
        let message = format!("saved map to {}", path.display());
        self.emit(EventKind::MapSaved, message.clone());
        Ok(message)
    }

    /// Renders the map and, once play has started, each player's state.
    pub fn show_map(&self) -> String {
        if self.editor.map().is_empty() {
            return "empty map".to_string();
        }
        let mut out = self.editor.map().to_string();
        if self.phase.is_in_play() || self.phase == Phase::GameOver {
            out.push_str(&format!("round {}, {}\n", self.gameplay.round(), self.phase));
            for p in self.gameplay.players() {
                let hand: Vec<&str> = p.hand().iter().map(|c| c.kind().name()).collect();
                out.push_str(&format!(
                    "{} ({}): {} countries, {} in pool, cards [{}]{}\n",
                    p.name(),
                    p.strategy(),
                    self.editor.map().owned_count(p.name()),
                    p.reinforcements,
                    hand.join(", "),
                    if p.is_eliminated() { ", eliminated" } else { "" }
                ));
            }
        }
        out
    }

    /// Adds a player. Only possible during player setup.
    pub fn add_player(&mut self, name: &str, strategy: StrategyKind) -> Result<()> {
        if self.phase != Phase::Startup {
            return Err(GameError::InvalidCommand(format!(
                "players cannot join during {}",
                self.phase
            )));
        }
        self.gameplay.add_player(name, strategy)
    }

    /// Applies `gameplayer -add <name> [strategy] -remove <name>` groups,
    /// all or none.
    fn edit_players(&mut self, command: &Command) -> Result<String> {
        enum Edit {
            Add(String, StrategyKind),
            Remove(String),
        }
        let mut names: Vec<String> = self
            .gameplay
            .players()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let mut edits = Vec::new();
        for group in command.option_groups()? {
            let v = &group.values;
            match (group.option.as_str(), v.len()) {
                ("add", 1 | 2) => {
                    let strategy = match v.get(1) {
                        Some(s) => s.parse::<StrategyKind>()?,
                        None => StrategyKind::Human,
                    };
                    if names.contains(&v[0]) {
                        return Err(GameError::InvalidArgument(format!(
                            "player '{}' already exists",
                            v[0]
                        )));
                    }
                    names.push(v[0].clone());
                    edits.push(Edit::Add(v[0].clone(), strategy));
                }
                ("remove", 1) => {
                    let pos = names
                        .iter()
                        .position(|n| *n == v[0])
                        .ok_or_else(|| GameError::not_found("player", v[0].as_str()))?;
                    names.remove(pos);
                    edits.push(Edit::Remove(v[0].clone()));
                }
                (option, n) => {
                    return Err(GameError::InvalidArgument(format!(
                        "gameplayer does not take -{option} with {n} value(s)"
                    )))
                }
            }
        }

        let mut done = Vec::new();
        for edit in edits {
            match edit {
                Edit::Add(name, strategy) => {
                    self.gameplay.add_player(&name, strategy)?;
                    done.push(format!("added {name} ({strategy})"));
                }
                Edit::Remove(name) => {
                    self.gameplay.remove_player(&name)?;
                    done.push(format!("removed {name}"));
                }
            }
        }
        Ok(done.join("; "))
    }

    /// Deals the countries out and starts round 1.
    pub fn assign_countries(&mut self) -> Result<String> {
        if self.phase != Phase::Startup {
            return Err(GameError::InvalidCommand(format!(
                "countries cannot be assigned during {}",
                self.phase
            )));
        }
        self.gameplay.assign_countries(self.editor.map_mut())?;
        info!(
            "game starts with {} players on {} countries",
            self.gameplay.players().len(),
            self.editor.map().country_count()
        );
        self.set_phase(Phase::Reinforcement);
        Ok(format!("countries assigned\n{}", self.drive()))
    }

    /// Polls automatic players and runs execution until a console player
    /// has to act or the game ends. Returns a status line.
    pub fn drive(&mut self) -> String {
        loop {
            match self.phase {
                Phase::Reinforcement | Phase::IssueOrder => {
                    let poll = self.gameplay.poll(
                        self.editor.map_mut(),
                        self.phase,
                        self.events.as_mut(),
                    );
                    match poll {
                        Poll::Progress => {}
                        Poll::AwaitInput(_) => return self.status(),
                        Poll::PhaseComplete => {
                            let next = if self.phase == Phase::Reinforcement {
                                Phase::IssueOrder
                            } else {
                                Phase::ExecuteOrder
                            };
                            self.set_phase(next);
                        }
                    }
                }
                Phase::ExecuteOrder => {
                    self.gameplay
                        .execute_orders(self.editor.map_mut(), self.events.as_mut());
                    match self
                        .gameplay
                        .end_round(self.editor.map_mut(), self.events.as_mut())
                    {
                        RoundEnd::Continue => self.set_phase(Phase::Reinforcement),
                        RoundEnd::Won(_) | RoundEnd::Draw => self.finish(),
                    }
                }
                Phase::MapEditor | Phase::Startup | Phase::GameOver => return self.status(),
            }
        }
    }

    fn finish(&mut self) {
        self.gameplay
            .cancel(self.editor.map_mut(), self.events.as_mut());
        self.phase = Phase::GameOver;
        let message = self.outcome();
        info!("{message}");
        self.emit(EventKind::GameOver, message);
    }

    fn outcome(&self) -> String {
        match self.gameplay.winner() {
            Some(name) => format!(
                "game over: {name} wins in round {}",
                self.gameplay.round()
            ),
            None => format!(
                "game over: draw after {} rounds",
                self.gameplay.round()
            ),
        }
    }

    /// Describes whose turn it is, or how the game ended.
    pub fn status(&self) -> String {
        match (self.phase, self.gameplay.awaiting()) {
            (Phase::GameOver, _) => self.outcome(),
            (Phase::Reinforcement | Phase::IssueOrder, Some(p)) => format!(
                "{} to play: {}, round {}, {} armies in pool",
                p.name(),
                self.phase,
                self.gameplay.round(),
                p.reinforcements
            ),
            (phase, _) => format!("phase: {phase}"),
        }
    }

    /// Captures the whole game.
    pub fn to_snapshot(&self) -> GameSnapshot {
        let map = self.editor.map();
        GameSnapshot {
            version: SNAPSHOT_VERSION,
            phase: self.phase,
            round: self.gameplay.round(),
            max_turns: self.gameplay.max_turns(),
            current_player: self.gameplay.current_index(),
            next_seq: self.gameplay.next_seq(),
            winner: self.gameplay.winner().map(str::to_string),
            map: MapRecord::capture(map),
            players: self
                .gameplay
                .players()
                .iter()
                .map(|p| PlayerRecord::capture(p, map))
                .collect(),
            future_orders: self
                .gameplay
                .future_orders()
                .map(|o| OrderRecord::capture(o, map))
                .collect(),
            active_truces: self
                .gameplay
                .active_truces()
                .iter()
                .map(|o| OrderRecord::capture(o, map))
                .collect(),
        }
    }

    /// Rebuilds an engine from a snapshot. Nothing is driven.
    pub fn from_snapshot(
        config: GameConfig,
        events: Box<dyn EventSink>,
        snapshot: &GameSnapshot,
    ) -> Result<Self> {
        let mut engine = Self::with_sink(config, events);
        engine.restore(snapshot)?;
        Ok(engine)
    }

    /// Replaces the current game with a snapshot, or leaves it untouched
    /// when the snapshot is inconsistent.
    fn restore(&mut self, snapshot: &GameSnapshot) -> Result<()> {
        let map = snapshot.map.rebuild()?;
        let mut players = Vec::with_capacity(snapshot.players.len());
        for record in &snapshot.players {
            if players.iter().any(|p: &Player| p.name() == record.name) {
                return Err(GameError::InvalidGame(format!(
                    "player '{}' appears twice",
                    record.name
                )));
            }
            players.push(record.rebuild(&map)?);
        }
        for country in map.countries() {
            if let Some(owner) = country.owner() {
                if !players.iter().any(|p| p.name() == owner) {
                    return Err(GameError::InvalidGame(format!(
                        "{} is owned by unknown player '{owner}'",
                        country.name()
                    )));
                }
            }
        }
        let rebuild = |records: &[OrderRecord]| -> Result<Vec<_>> {
            records.iter().map(|r| r.rebuild(&map)).collect()
        };
        let schedule = Schedule {
            round: snapshot.round,
            current: snapshot.current_player,
            next_seq: snapshot.next_seq,
            max_turns: snapshot.max_turns,
            future_orders: rebuild(&snapshot.future_orders)?,
            active_truces: rebuild(&snapshot.active_truces)?,
            winner: snapshot.winner.clone(),
        };

        self.gameplay = GamePlay::restore(players, schedule, self.config.rng());
        self.editor.replace(map, None);
        self.phase = snapshot.phase;
        Ok(())
    }

    /// Writes the game as JSON.
    pub fn save_game(&mut self, path: &Path) -> Result<String> {
        let json = self.to_snapshot().to_json()?;
        fs::write(path, json)?;
        let message = format!("saved game to {}", path.display());
        self.emit(EventKind::GameSaved, message.clone());
        Ok(message)
    }

    /// Loads a game saved with [`GameEngine::save_game`] and resumes it.
    pub fn load_game(&mut self, path: &Path) -> Result<String> {
        let text = fs::read_to_string(path)?;
        let snapshot = GameSnapshot::from_json(&text)?;
        self.restore(&snapshot)?;
        let message = format!(
            "loaded game from {} (round {}, {})",
            path.display(),
            self.gameplay.round(),
            self.phase
        );
        self.emit(EventKind::GameLoaded, message.clone());
        Ok(format!("{message}\n{}", self.drive()))
    }
}
