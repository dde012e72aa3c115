//! Tournament mode.
//!
//! Plays every configured map a number of times with one automatic player
//! per strategy and collects the outcomes into a result matrix (rows = maps,
//! columns = games). Every game runs on its own engine, so games can be
//! spread over a rayon pool and gathered back by position.

use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::engine::{GameConfig, GameEngine, NullSink, Phase};
use crate::error::{GameError, Result};
use crate::protocol::parser::Command;
use crate::strategy::StrategyKind;

/// Tournament settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentConfig {
    /// Map files to play on (2-5).
    pub maps: Vec<PathBuf>,
    /// Competing strategies (2-4, automatic only).
    pub strategies: Vec<StrategyKind>,
    /// Games played on each map (1-5).
    pub games_per_map: u32,
    /// Rounds before a game is a draw (10-50).
    pub max_turns: u32,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        TournamentConfig {
            maps: Vec::new(),
            strategies: vec![StrategyKind::Aggressive, StrategyKind::Benevolent],
            games_per_map: 1,
            max_turns: 30,
            seed: 0,
            threads: 1,
        }
    }
}

fn out_of_range(what: &str, value: usize, lo: usize, hi: usize) -> GameError {
    GameError::InvalidArgument(format!("{what} must be between {lo} and {hi}, got {value}"))
}

impl TournamentConfig {
    /// Checks every range before any game is played.
    pub fn validate(&self) -> Result<()> {
        if !(2..=5).contains(&self.maps.len()) {
            return Err(out_of_range("number of maps", self.maps.len(), 2, 5));
        }
        if !(2..=4).contains(&self.strategies.len()) {
            return Err(out_of_range("number of strategies", self.strategies.len(), 2, 4));
        }
        for (i, s) in self.strategies.iter().enumerate() {
            if !s.is_automatic() {
                return Err(GameError::InvalidArgument(format!(
                    "{s} players cannot take part in a tournament"
                )));
            }
            if self.strategies[..i].contains(s) {
                return Err(GameError::InvalidArgument(format!(
                    "strategy {s} is listed twice"
                )));
            }
        }
        if !(1..=5).contains(&self.games_per_map) {
            return Err(out_of_range("games per map", self.games_per_map as usize, 1, 5));
        }
        if !(10..=50).contains(&self.max_turns) {
            return Err(out_of_range("max turns", self.max_turns as usize, 10, 50));
        }
        Ok(())
    }

    /// Reads `tournament -M maps.. -P strategies.. -G games -D turns`.
    pub fn from_command(command: &Command) -> Result<Self> {
        let mut config = TournamentConfig::default();
        let (mut maps, mut players, mut games, mut turns) = (false, false, false, false);
        for group in command.option_groups()? {
            let v = &group.values;
            match group.option.as_str() {
                "m" => {
                    config.maps = v.iter().map(PathBuf::from).collect();
                    maps = true;
                }
                "p" => {
                    config.strategies = v
                        .iter()
                        .map(|s| s.parse::<StrategyKind>())
                        .collect::<Result<_>>()?;
                    players = true;
                }
                "g" => {
                    config.games_per_map = single_count(&group.option, v)?;
                    games = true;
                }
                "d" => {
                    config.max_turns = single_count(&group.option, v)?;
                    turns = true;
                }
                other => {
                    return Err(GameError::InvalidArgument(format!(
                        "tournament does not take -{other}"
                    )))
                }
            }
        }
        if !(maps && players && games && turns) {
            return Err(GameError::InvalidArgument(
                "usage: tournament -M <maps> -P <strategies> -G <games> -D <turns>".to_string(),
            ));
        }
        config.validate()?;
        Ok(config)
    }
}

fn single_count(option: &str, values: &[String]) -> Result<u32> {
    match values {
        [v] => v.parse::<u32>().map_err(|_| {
            GameError::InvalidArgument(format!("-{option} expects a number, got '{v}'"))
        }),
        _ => Err(GameError::InvalidArgument(format!(
            "-{option} expects exactly one value"
        ))),
    }
}

/// Outcome of one tournament game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Winner(StrategyKind),
    Draw,
    /// The game could not be played.
    Failed(String),
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Winner(s) => write!(f, "{s}"),
            GameResult::Draw => f.write_str("Draw"),
            GameResult::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// The result matrix of a tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub maps: Vec<String>,
    pub strategies: Vec<StrategyKind>,
    pub games_per_map: u32,
    pub max_turns: u32,
    /// One row per map, one cell per game.
    pub results: Vec<Vec<GameResult>>,
}

impl TournamentResult {
    /// Total wins per strategy, in roster order.
    pub fn wins(&self) -> Vec<(StrategyKind, usize)> {
        self.strategies
            .iter()
            .map(|s| {
                let n = self
                    .results
                    .iter()
                    .flatten()
                    .filter(|r| **r == GameResult::Winner(*s))
                    .count();
                (*s, n)
            })
            .collect()
    }

    /// Renders the matrix as a text table.
    pub fn render(&self) -> String {
        let roster: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        let mut out = String::new();
        let _ = writeln!(out, "M: {}", self.maps.join(", "));
        let _ = writeln!(out, "P: {}", roster.join(", "));
        let _ = writeln!(out, "G: {}", self.games_per_map);
        let _ = writeln!(out, "D: {}", self.max_turns);

        let width = self.maps.iter().map(String::len).max().unwrap_or(0).max(3);
        let _ = write!(out, "\n{:width$}", "Map");
        for g in 1..=self.games_per_map {
            let _ = write!(out, " | {:<12}", format!("Game {g}"));
        }
        out.push('\n');
        for (map, row) in self.maps.iter().zip(&self.results) {
            let _ = write!(out, "{map:width$}");
            for cell in row {
                let _ = write!(out, " | {:<12}", cell.to_string());
            }
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::InvalidArgument(e.to_string()))
    }
}

/// Derives a nonzero per-game seed from the tournament seed.
fn game_seed(seed: u64, map: usize, game: u32) -> u64 {
    if seed == 0 {
        return 0;
    }
    let mut z = seed
        .wrapping_add((map as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(u64::from(game).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31)).max(1)
}

/// Plays one game on a fresh engine. Players are named after their
/// strategies.
pub fn play_game(
    map: &Path,
    strategies: &[StrategyKind],
    max_turns: u32,
    seed: u64,
) -> Result<GameResult> {
    let config = GameConfig { max_turns, seed };
    let mut engine = GameEngine::with_sink(config, Box::new(NullSink));
    engine.load_map(map)?;
    for s in strategies {
        engine.add_player(s.name(), *s)?;
    }
    engine.assign_countries()?;
    if engine.phase() != Phase::GameOver {
        return Err(GameError::InvalidGame(format!(
            "game stopped in {} waiting for input",
            engine.phase()
        )));
    }
    Ok(match engine.winner().and_then(StrategyKind::from_name) {
        Some(s) => GameResult::Winner(s),
        None => GameResult::Draw,
    })
}

fn play_cell(config: &TournamentConfig, map: usize, game: u32) -> GameResult {
    let path = &config.maps[map];
    let start = Instant::now();
    let seed = game_seed(config.seed, map, game);
    let result = match play_game(path, &config.strategies, config.max_turns, seed) {
        Ok(result) => result,
        Err(e) => {
            warn!("{} game {}: {e}", path.display(), game + 1);
            GameResult::Failed(e.to_string())
        }
    };
    info!(
        "{} game {}: {result} ({:.2}s)",
        path.display(),
        game + 1,
        start.elapsed().as_secs_f64()
    );
    result
}

/// Runs a whole tournament.
///
/// When `config.threads > 1`, games are played concurrently using rayon.
pub fn run_tournament(config: &TournamentConfig) -> Result<TournamentResult> {
    config.validate()?;
    let cells: Vec<(usize, u32)> = (0..config.maps.len())
        .flat_map(|m| (0..config.games_per_map).map(move |g| (m, g)))
        .collect();

    let flat: Vec<GameResult> = if config.threads > 1 {
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| GameError::InvalidArgument(format!("thread pool: {e}")))?;
        pool.install(|| {
            cells
                .into_par_iter()
                .map(|(m, g)| play_cell(config, m, g))
                .collect()
        })
    } else {
        cells
            .into_iter()
            .map(|(m, g)| play_cell(config, m, g))
            .collect()
    };

    let results = flat
        .chunks(config.games_per_map as usize)
        .map(<[GameResult]>::to_vec)
        .collect();
    Ok(TournamentResult {
        maps: config.maps.iter().map(|p| p.display().to_string()).collect(),
        strategies: config.strategies.clone(),
        games_per_map: config.games_per_map,
        max_turns: config.max_turns,
        results,
    })
}
