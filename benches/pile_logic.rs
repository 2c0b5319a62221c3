use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rigid_tetris::core::cluster::plan_clears;
use rigid_tetris::core::pile;
use rigid_tetris::core::{EngineConfig, Game, KinematicWorld, MemoryHighScore};
use rigid_tetris::types::{PieceKind, Vec2};

fn new_game() -> Game<KinematicWorld> {
    let config = EngineConfig::default();
    let world = KinematicWorld::new(&config.field);
    Game::new(config, world, MemoryHighScore::default(), 12345)
}

/// A 48-piece pile of mixed kinds
fn packed_pile() -> Game<KinematicWorld> {
    let mut game = new_game();
    let kinds = [PieceKind::O, PieceKind::I, PieceKind::T];
    for col in 0..6 {
        for row in 0..8 {
            let kind = kinds[(col + row) % kinds.len()];
            let pos = Vec2::new(30.0 + 60.0 * col as f32, 690.0 - 60.0 * row as f32);
            game.insert_settled(kind, pos);
        }
    }
    game
}

fn bench_tick(c: &mut Criterion) {
    let mut game = new_game();
    game.start();

    c.bench_function("game_tick_16ms", |b| {
        b.iter(|| {
            game.tick(black_box(16));
        })
    });
}

fn bench_plan_clears(c: &mut Criterion) {
    let game = packed_pile();
    let proximity = game.config().proximity_threshold();

    c.bench_function("plan_clears_48_pieces", |b| {
        b.iter(|| {
            plan_clears(
                game.registry(),
                game.world(),
                black_box(3),
                proximity,
                &game.config().clear,
            )
        })
    });
}

fn bench_pile_scan(c: &mut Criterion) {
    let game = packed_pile();

    c.bench_function("pile_scan_48_pieces", |b| {
        b.iter(|| pile::scan(game.registry(), game.world(), black_box(game.config())))
    });
}

fn bench_evaluate_and_remove(c: &mut Criterion) {
    c.bench_function("evaluate_clears_stack", |b| {
        b.iter(|| {
            let mut game = new_game();
            for y in [705.0, 675.0, 645.0, 615.0] {
                game.insert_settled(PieceKind::I, Vec2::new(180.0, y));
            }
            game.evaluate_clears()
        })
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_plan_clears,
    bench_pile_scan,
    bench_evaluate_and_remove
);
criterion_main!(benches);
