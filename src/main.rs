//! Headless simulation runner (default binary).
//!
//! Plays one session against the rapier world with a seeded autoplayer,
//! logs gameplay events, and prints the final snapshot as JSON on stdout.
//!
//! Configured through environment variables:
//!
//! - `RIGID_TETRIS_TICKS`: ticks to simulate (default 3600, one minute)
//! - `RIGID_TETRIS_SEED`: piece and autoplayer seed (default 1)
//! - `RIGID_TETRIS_CONFIG`: optional engine config JSON
//! - `RIGID_TETRIS_HIGHSCORE`: high score file (default `highscore.json`)
//! - `RUST_LOG`: log filter (default `info`)

use std::env;

use anyhow::{Context, Result};

use rigid_tetris::core::{EngineConfig, Game, HighScoreStore, JsonFileHighScore, SimpleRng};
use rigid_tetris::physics::RapierWorld;
use rigid_tetris::types::{GameEvent, Intent, TICK_MS};

struct RunConfig {
    ticks: u32,
    seed: u32,
    config_path: Option<String>,
    high_score_path: String,
}

impl RunConfig {
    fn from_env() -> Self {
        let ticks = env::var("RIGID_TETRIS_TICKS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        let seed = env::var("RIGID_TETRIS_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let config_path = env::var("RIGID_TETRIS_CONFIG")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        let high_score_path =
            env::var("RIGID_TETRIS_HIGHSCORE").unwrap_or_else(|_| "highscore.json".to_string());

        Self {
            ticks,
            seed,
            config_path,
            high_score_path,
        }
    }
}

/// Holds one random intent for a short burst, then picks another.
struct AutoPlayer {
    rng: SimpleRng,
    held: Option<Intent>,
    remaining: u32,
}

impl AutoPlayer {
    fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed ^ 0x5bd1_e995),
            held: None,
            remaining: 0,
        }
    }

    fn drive<H: HighScoreStore>(&mut self, game: &mut Game<RapierWorld, H>) {
        if game.active().is_none() {
            if let Some(intent) = self.held.take() {
                game.apply_intent(intent, false);
            }
            self.remaining = 0;
            return;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            return;
        }
        if let Some(intent) = self.held.take() {
            game.apply_intent(intent, false);
        }

        let intent = match self.rng.next_range(6) {
            0 => Intent::MoveLeft,
            1 => Intent::MoveRight,
            2 => Intent::RotateLeft,
            3 => Intent::RotateRight,
            4 => Intent::SoftDrop,
            _ => Intent::HardDrop,
        };
        game.apply_intent(intent, true);
        self.held = Some(intent);
        self.remaining = 8 + self.rng.next_range(24);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let run = RunConfig::from_env();
    let config = match &run.config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let world = RapierWorld::new(&config.field);
    let store = JsonFileHighScore::new(&run.high_score_path);
    log::info!("High score file: {}", store.path().display());
    let mut game = Game::new(config, world, store, run.seed);
    let mut player = AutoPlayer::new(run.seed);

    game.start();
    for _ in 0..run.ticks {
        if game.session().is_game_over() {
            break;
        }
        if game.session().phase().is_paused() {
            game.dismiss_level_up();
        }
        player.drive(&mut game);
        game.tick(TICK_MS);

        for event in game.take_events() {
            match event {
                GameEvent::PieceSpawned { .. } | GameEvent::PieceSettled { .. } => {}
                other => log::info!("{other:?}"),
            }
        }
    }

    game.persist_high_score();
    let snapshot = game.snapshot();
    let json = serde_json::to_string_pretty(&snapshot).context("serialize final snapshot")?;
    println!("{}", json);
    Ok(())
}
