//! Tournament CLI.
//!
//! Plays every map a number of times with one player per strategy and
//! prints the result matrix.
//!
//! Usage:
//!   cargo run --release --bin tournament -- -M maps/twin.map maps/world.map \
//!       -P aggressive benevolent -G 3 -D 30

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use warzone::strategy::StrategyKind;
use warzone::tournament::{run_tournament, TournamentConfig};

#[derive(Parser, Debug)]
#[command(name = "tournament", about = "Pit AI strategies against each other")]
struct Args {
    /// Map files (2-5).
    #[arg(short = 'M', long = "maps", num_args = 1.., required = true)]
    maps: Vec<PathBuf>,
    /// Strategies (2-4): aggressive, benevolent, random, cheater.
    #[arg(short = 'P', long = "players", num_args = 1.., required = true)]
    strategies: Vec<StrategyKind>,
    /// Games per map (1-5).
    #[arg(short = 'G', long = "games", default_value_t = 1)]
    games: u32,
    /// Rounds before a game is a draw (10-50).
    #[arg(short = 'D', long = "turns", default_value_t = 30)]
    turns: u32,
    /// Number of parallel threads.
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Random seed, 0 for entropy.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Print the result as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = TournamentConfig {
        maps: args.maps,
        strategies: args.strategies,
        games_per_map: args.games,
        max_turns: args.turns,
        seed: args.seed,
        threads: args.threads,
    };

    let start = Instant::now();
    let result = match run_tournament(&config) {
        Ok(r) => r,
        Err(e) => {
            error!("{e}");
            process::exit(2);
        }
    };
    info!(
        "{} games in {:.1}s",
        config.maps.len() * config.games_per_map as usize,
        start.elapsed().as_secs_f64()
    );

    if args.json {
        match result.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("{e}");
                process::exit(1);
            }
        }
    } else {
        print!("{}", result.render());
        for (strategy, wins) in result.wins() {
            println!("{strategy}: {wins} win(s)");
        }
    }
}
