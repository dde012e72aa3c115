//! Map editing.
//!
//! Edit commands are made of option groups (`-add`, `-remove`). All groups
//! of one command are applied to a copy of the map and the copy replaces
//! the map only when every group succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::board::Map;
use crate::error::{GameError, Result};
use crate::protocol::mapfile::{parse_map, write_map};
use crate::protocol::parser::{Command, CommandKind, OptionGroup};

/// Owns the map being built or played on.
#[derive(Debug, Default)]
pub struct MapEditor {
    map: Map,
    path: Option<PathBuf>,
}

impl MapEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    /// The file the map was last loaded from or saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replaces the map wholesale.
    pub fn replace(&mut self, map: Map, path: Option<&Path>) {
        self.map = map;
        self.path = path.map(Path::to_path_buf);
    }

    /// Reads a map file without validating it.
    pub fn read(path: &Path) -> Result<Map> {
        let text = fs::read_to_string(path)?;
        parse_map(&text)
    }

    /// Loads a map file, keeping the current map if the file is unreadable
    /// or malformed.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let map = Self::read(path)?;
        self.map = map;
        self.path = Some(path.to_path_buf());
        info!(
            "loaded {} ({} countries)",
            path.display(),
            self.map.country_count()
        );
        Ok(())
    }

    /// Opens a map for editing. A missing file starts an empty map that
    /// will be saved under that name.
    pub fn open(&mut self, path: &Path) -> Result<bool> {
        if path.exists() {
            self.load(path)?;
            Ok(true)
        } else {
            self.map.clear();
            self.path = Some(path.to_path_buf());
            Ok(false)
        }
    }

    /// Validates and writes the map.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.map.validate()?;
        fs::write(path, write_map(&self.map))?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Applies every option group of an edit command, or none of them.
    pub fn apply(&mut self, command: &Command) -> Result<String> {
        let groups = command.option_groups()?;
        let mut draft = self.map.clone();
        let mut done = Vec::with_capacity(groups.len());
        for group in &groups {
            done.push(apply_group(&mut draft, command.kind, group)?);
        }
        self.map = draft;
        Ok(done.join("; "))
    }
}

fn apply_group(map: &mut Map, kind: CommandKind, group: &OptionGroup) -> Result<String> {
    let v = &group.values;
    match (kind, group.option.as_str(), v.len()) {
        (CommandKind::EditContinent, "add", 2) => {
            let value = v[1].parse::<u32>().map_err(|_| {
                GameError::InvalidArgument(format!("'{}' is not a valid control value", v[1]))
            })?;
            map.add_continent(&v[0], value)?;
            Ok(format!("added continent {} ({value})", v[0]))
        }
        (CommandKind::EditContinent, "remove", 1) => {
            map.remove_continent(&v[0])?;
            Ok(format!("removed continent {}", v[0]))
        }
        (CommandKind::EditCountry, "add", 2) => {
            map.add_country_to_continent(&v[0], &v[1])?;
            Ok(format!("added country {} to {}", v[0], v[1]))
        }
        (CommandKind::EditCountry, "remove", 1) => {
            map.remove_country(&v[0])?;
            Ok(format!("removed country {}", v[0]))
        }
        (CommandKind::EditNeighbor, "add", 2) => {
            map.add_neighbor(&v[0], &v[1])?;
            Ok(format!("linked {} and {}", v[0], v[1]))
        }
        (CommandKind::EditNeighbor, "remove", 2) => {
            map.remove_neighbor(&v[0], &v[1])?;
            Ok(format!("unlinked {} and {}", v[0], v[1]))
        }
        (_, option, n) => Err(GameError::InvalidArgument(format!(
            "{kind} does not take -{option} with {n} value(s)"
        ))),
    }
}
