//! Console command parser.
//!
//! Parses a line of input into a structured [`Command`]: a head keyword and
//! its positional values. Edit commands carry option groups such as
//! `-add <name> <value>` which are split out by [`Command::option_groups`].

use std::fmt;

use crate::error::{GameError, Result};

/// Every command the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    LoadMap,
    EditMap,
    EditContinent,
    EditCountry,
    EditNeighbor,
    SaveMap,
    ValidateMap,
    ShowMap,
    GamePlayer,
    AssignCountries,
    Deploy,
    Advance,
    Bomb,
    Blockade,
    Airlift,
    Negotiate,
    Commit,
    SaveGame,
    LoadGame,
    Tournament,
    Quit,
}

/// All command kinds, in help order.
pub const ALL_COMMANDS: [CommandKind; 21] = [
    CommandKind::LoadMap,
    CommandKind::EditMap,
    CommandKind::EditContinent,
    CommandKind::EditCountry,
    CommandKind::EditNeighbor,
    CommandKind::SaveMap,
    CommandKind::ValidateMap,
    CommandKind::ShowMap,
    CommandKind::GamePlayer,
    CommandKind::AssignCountries,
    CommandKind::Deploy,
    CommandKind::Advance,
    CommandKind::Bomb,
    CommandKind::Blockade,
    CommandKind::Airlift,
    CommandKind::Negotiate,
    CommandKind::Commit,
    CommandKind::SaveGame,
    CommandKind::LoadGame,
    CommandKind::Tournament,
    CommandKind::Quit,
];

impl CommandKind {
    /// The keyword typed at the console.
    pub const fn keyword(self) -> &'static str {
        match self {
            CommandKind::LoadMap => "loadmap",
            CommandKind::EditMap => "editmap",
            CommandKind::EditContinent => "editcontinent",
            CommandKind::EditCountry => "editcountry",
            CommandKind::EditNeighbor => "editneighbor",
            CommandKind::SaveMap => "savemap",
            CommandKind::ValidateMap => "validatemap",
            CommandKind::ShowMap => "showmap",
            CommandKind::GamePlayer => "gameplayer",
            CommandKind::AssignCountries => "assigncountries",
            CommandKind::Deploy => "deploy",
            CommandKind::Advance => "advance",
            CommandKind::Bomb => "bomb",
            CommandKind::Blockade => "blockade",
            CommandKind::Airlift => "airlift",
            CommandKind::Negotiate => "negotiate",
            CommandKind::Commit => "commit",
            CommandKind::SaveGame => "savegame",
            CommandKind::LoadGame => "loadgame",
            CommandKind::Tournament => "tournament",
            CommandKind::Quit => "quit",
        }
    }

    pub fn from_keyword(s: &str) -> Option<CommandKind> {
        let lower = s.to_ascii_lowercase();
        ALL_COMMANDS.into_iter().find(|k| k.keyword() == lower)
    }

    /// Number of positional values the command takes, or `None` for
    /// commands made of option groups.
    const fn arity(self) -> Option<usize> {
        match self {
            CommandKind::EditContinent
            | CommandKind::EditCountry
            | CommandKind::EditNeighbor
            | CommandKind::GamePlayer
            | CommandKind::Tournament => None,
            CommandKind::ValidateMap
            | CommandKind::ShowMap
            | CommandKind::AssignCountries
            | CommandKind::Commit
            | CommandKind::Quit => Some(0),
            CommandKind::LoadMap
            | CommandKind::EditMap
            | CommandKind::SaveMap
            | CommandKind::SaveGame
            | CommandKind::LoadGame
            | CommandKind::Bomb
            | CommandKind::Blockade
            | CommandKind::Negotiate => Some(1),
            CommandKind::Deploy => Some(2),
            CommandKind::Advance | CommandKind::Airlift => Some(3),
        }
    }

    /// Returns true for commands that issue an order.
    pub const fn is_order(self) -> bool {
        matches!(
            self,
            CommandKind::Deploy
                | CommandKind::Advance
                | CommandKind::Bomb
                | CommandKind::Blockade
                | CommandKind::Airlift
                | CommandKind::Negotiate
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub args: Vec<String>,
}

/// One `-option value...` group of an edit command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    pub option: String,
    pub values: Vec<String>,
}

impl Command {
    pub fn new(kind: CommandKind, args: &[&str]) -> Self {
        Command {
            kind,
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Returns the positional value at `idx`.
    pub fn arg(&self, idx: usize) -> Result<&str> {
        self.args.get(idx).map(String::as_str).ok_or_else(|| {
            GameError::InvalidArgument(format!("{} is missing argument {}", self.kind, idx + 1))
        })
    }

    /// Parses the positional value at `idx` as an army count.
    pub fn count_arg(&self, idx: usize) -> Result<u32> {
        let raw = self.arg(idx)?;
        raw.parse::<u32>()
            .map_err(|_| GameError::InvalidArgument(format!("'{raw}' is not a valid number")))
    }

    /// Splits the arguments into option groups. Every group must start with
    /// a `-option` token and carry at least one value.
    pub fn option_groups(&self) -> Result<Vec<OptionGroup>> {
        let mut groups: Vec<OptionGroup> = Vec::new();
        for token in &self.args {
            if let Some(option) = token.strip_prefix('-').filter(|o| !o.is_empty()) {
                groups.push(OptionGroup {
                    option: option.to_ascii_lowercase(),
                    values: Vec::new(),
                });
            } else if let Some(group) = groups.last_mut() {
                group.values.push(token.clone());
            } else {
                return Err(GameError::InvalidArgument(format!(
                    "{}: expected an option before '{token}'",
                    self.kind
                )));
            }
        }
        if groups.is_empty() {
            return Err(GameError::InvalidArgument(format!(
                "{} needs at least one option",
                self.kind
            )));
        }
        if let Some(empty) = groups.iter().find(|g| g.values.is_empty()) {
            return Err(GameError::InvalidArgument(format!(
                "{}: option -{} has no values",
                self.kind, empty.option
            )));
        }
        Ok(groups)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.keyword())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Parses a single line of input into a `Command`.
///
/// Returns `Ok(None)` for blank lines and `#` comments. Unknown keywords fail
/// with `InvalidCommand`; a wrong number of positional values fails with
/// `InvalidArgument`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = trimmed.split_whitespace();
    let head = tokens.next().unwrap_or_default();
    let kind = CommandKind::from_keyword(head)
        .ok_or_else(|| GameError::InvalidCommand(format!("unknown command '{head}'")))?;
    let args: Vec<String> = tokens.map(str::to_string).collect();

    if let Some(expected) = kind.arity() {
        if args.len() != expected {
            return Err(GameError::InvalidArgument(format!(
                "{kind} takes {expected} argument(s), got {}",
                args.len()
            )));
        }
    }
    Ok(Some(Command { kind, args }))
}
