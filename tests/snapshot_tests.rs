//! Presentation snapshot tests

use rigid_tetris::core::{
    EngineConfig, Game, GameSnapshot, KinematicWorld, MemoryHighScore, PieceState,
};
use rigid_tetris::types::{PieceKind, Phase, Vec2};

fn new_game() -> Game<KinematicWorld> {
    let config = EngineConfig::default();
    let world = KinematicWorld::new(&config.field);
    Game::new(config, world, MemoryHighScore(250), 3)
}

#[test]
fn test_snapshot_lists_active_and_pile() {
    let mut game = new_game();
    game.insert_settled(PieceKind::O, Vec2::new(30.0, 690.0));
    game.start();

    let snap = game.snapshot();
    assert_eq!(snap.phase, Phase::Playing);
    assert_eq!(snap.high_score, 250);
    assert_eq!(snap.level, 1);
    assert_eq!(snap.min_cluster, 3);
    assert_eq!(snap.seed, 3);
    assert_eq!(snap.pile.len(), 1);
    assert_eq!(snap.pile[0].kind, PieceKind::O);
    assert_eq!(snap.pile[0].state, PieceState::Settled);
    assert_eq!(snap.pile[0].blocks.len(), 4);

    let active = snap.active.expect("active piece");
    assert_eq!(active.state, PieceState::Active);
    assert_eq!(active.position, game.config().field.spawn_point());
}

#[test]
fn test_fill_percent_tracks_pile_height() {
    let mut game = new_game();
    game.insert_settled(PieceKind::O, Vec2::new(30.0, 690.0));
    game.start();
    game.tick(16);

    let stats = game.snapshot().pile_stats;
    // O is 60 tall; usable height is 720 - 90.
    let expected = 60.0 / 630.0 * 100.0;
    assert!((stats.fill_percent - expected).abs() < 0.1, "{}", stats.fill_percent);
    assert_eq!(stats.settled, 1);
    assert_eq!(stats.moving, 0);
    assert!(!stats.danger);
}

#[test]
fn test_danger_flag_near_the_top() {
    let mut game = new_game();
    for y in [690.0, 630.0, 570.0, 510.0, 450.0, 390.0, 330.0, 270.0, 210.0] {
        game.insert_settled(PieceKind::O, Vec2::new(30.0, y));
    }
    game.start();
    game.tick(16);

    let stats = game.snapshot().pile_stats;
    assert!(stats.fill_percent >= 80.0, "{}", stats.fill_percent);
    assert!(stats.danger);
}

#[test]
fn test_snapshot_into_reuses_buffer() {
    let mut game = new_game();
    game.insert_settled(PieceKind::O, Vec2::new(30.0, 690.0));
    game.start();

    let mut snap = GameSnapshot::default();
    game.snapshot_into(&mut snap);
    let cap = snap.pile.capacity();
    game.snapshot_into(&mut snap);

    assert_eq!(snap.pile.len(), 1);
    assert_eq!(snap.pile.capacity(), cap);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let mut game = new_game();
    game.start();

    let value: serde_json::Value = serde_json::from_str(&game.snapshot().to_json().unwrap()).unwrap();
    assert_eq!(value["phase"], "playing");
    assert_eq!(value["score"], 0);
    assert_eq!(value["active"]["state"], "active");
    assert!(value["pile"].as_array().unwrap().is_empty());
}
