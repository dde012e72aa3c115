//! End-to-end games driven through the engine API.

use std::path::PathBuf;

use warzone::engine::{EventKind, GameConfig, GameEngine, MemorySink, Phase};
use warzone::protocol::parser::parse_command;
use warzone::GameError;

fn map_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("maps").join(name)
}

fn engine(max_turns: u32, sink: &MemorySink) -> GameEngine {
    let config = GameConfig { max_turns, seed: 99 };
    GameEngine::with_sink(config, Box::new(sink.clone()))
}

fn run(engine: &mut GameEngine, line: &str) -> Result<String, GameError> {
    let command = parse_command(line)?.expect("not a command");
    engine.execute_command(&command)
}

fn first_country_of(engine: &GameEngine, player: &str) -> String {
    engine
        .map()
        .countries()
        .find(|c| c.is_owned_by(player))
        .map(|c| c.name().to_string())
        .expect("player owns nothing")
}

#[test]
fn deployments_land_after_execution() {
    let sink = MemorySink::new();
    let mut engine = engine(10, &sink);
    run(&mut engine, &format!("loadmap {}", map_path("twin.map").display())).unwrap();
    run(&mut engine, "gameplayer -add alice -add bob").unwrap();
    run(&mut engine, "assigncountries").unwrap();
    assert_eq!(engine.awaiting_player(), Some("alice"));

    let target = first_country_of(&engine, "alice");
    let pool = engine.players()[0].reinforcements;
    assert!(pool >= 3);
    assert!(run(&mut engine, &format!("deploy {target} {}", pool + 1)).is_err());
    run(&mut engine, &format!("deploy {target} {pool}")).unwrap();

    // deploys reserve their armies but change nothing on the board yet
    assert_eq!(engine.players()[0].reinforcements, 0);
    assert_eq!(engine.map().find_country(&target).unwrap().armies, 1);

    for _ in 0..4 {
        run(&mut engine, "commit").unwrap();
    }
    assert_eq!(engine.round(), 2);
    assert_eq!(engine.phase(), Phase::Reinforcement);
    assert_eq!(engine.map().find_country(&target).unwrap().armies, 1 + pool);
    assert_eq!(sink.count(EventKind::OrderExecuted), 1);
}

#[test]
fn peaceful_strategies_draw_at_the_turn_limit() {
    let sink = MemorySink::new();
    let mut engine = engine(10, &sink);
    run(
        &mut engine,
        &format!("loadmap {}", map_path("archipelago.map").display()),
    )
    .unwrap();
    run(&mut engine, "gameplayer -add a benevolent -add b benevolent").unwrap();
    let reply = run(&mut engine, "assigncountries").unwrap();

    assert_eq!(engine.phase(), Phase::GameOver);
    assert_eq!(engine.winner(), None);
    assert_eq!(engine.round(), 10);
    assert!(reply.contains("draw"), "{reply}");
    assert_eq!(sink.count(EventKind::TurnCompleted), 9);
}

#[test]
fn cheater_conquers_and_game_freezes() {
    let sink = MemorySink::new();
    let mut engine = engine(30, &sink);
    run(
        &mut engine,
        &format!("loadmap {}", map_path("archipelago.map").display()),
    )
    .unwrap();
    run(
        &mut engine,
        "gameplayer -add cheat cheater -add meek benevolent -add rand random",
    )
    .unwrap();
    run(&mut engine, "assigncountries").unwrap();

    assert_eq!(engine.phase(), Phase::GameOver);
    assert_eq!(engine.winner(), Some("cheat"));
    assert_eq!(engine.map().owned_count("cheat"), 12);
    assert!(engine.players().iter().filter(|p| p.name() != "cheat").all(|p| p.is_eliminated()));
    assert_eq!(sink.count(EventKind::PlayerEliminated), 2);

    // nothing but showmap once the game is over
    let before = engine.map().clone();
    assert!(matches!(
        run(&mut engine, "commit"),
        Err(GameError::InvalidCommand(_))
    ));
    assert!(run(&mut engine, "showmap").unwrap().contains("cheat"));
    assert_eq!(engine.map(), &before);
}

#[test]
fn aggressive_games_always_finish() {
    for seed in 1..=5 {
        let config = GameConfig { max_turns: 40, seed };
        let mut engine = GameEngine::with_sink(config, Box::new(MemorySink::new()));
        engine.load_map(&map_path("archipelago.map")).unwrap();
        run(&mut engine, "gameplayer -add agg aggressive -add rnd random").unwrap();
        run(&mut engine, "assigncountries").unwrap();
        assert_eq!(engine.phase(), Phase::GameOver, "seed {seed}");
        assert!(engine.round() <= 40);
        // no order survives the end of the game
        assert!(engine.players().iter().all(|p| p.pending_order_count() == 0));
        assert_eq!(engine.gameplay().future_orders().count(), 0);
        assert!(engine.gameplay().active_truces().is_empty());
    }
}
