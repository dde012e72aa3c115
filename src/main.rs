//! Warzone console.
//!
//! Reads one command per line from stdin, runs it on the engine and writes
//! the reply to stdout. Engine events are echoed as `[event] message` lines.
//! `quit` or end of input stops the loop.

use std::io::{self, BufRead, Write};

use clap::Parser;
use log::debug;

use warzone::engine::{GameConfig, GameEngine, WriterSink};
use warzone::protocol::parser::{parse_command, CommandKind};

#[derive(Parser, Debug)]
#[command(name = "warzone", about = "Turn-based territorial conquest console")]
struct Args {
    /// Random seed, 0 for entropy.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Rounds before a game is declared a draw.
    #[arg(long, default_value_t = 50)]
    max_turns: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = GameConfig {
        max_turns: args.max_turns,
        seed: args.seed,
    };
    let mut engine = GameEngine::with_sink(config, Box::new(WriterSink::new(io::stdout())));
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let command = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };
        if command.kind == CommandKind::Quit {
            break;
        }

        debug!("command: {command}");
        match engine.execute_command(&command) {
            Ok(reply) => println!("{}", reply.trim_end()),
            Err(e) => println!("error: {e}"),
        }
        let _ = io::stdout().flush();
    }
}
