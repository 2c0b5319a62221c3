//! Core game logic - rules, state and orchestration over an abstract physics world
//!
//! Pieces are rigid compound bodies that fall, tumble and come to rest in a
//! heap. Nothing snaps to a grid: once a piece settles it joins the pile, and
//! groups of touching same-kind pieces large enough to meet the current
//! minimum cluster size are removed together.
//!
//! The crate never integrates motion itself. Everything physical goes through
//! the [`PhysicsWorld`] trait, so the rules run unchanged against the
//! deterministic [`KinematicWorld`] (tests, benches) or the rapier-backed
//! world in `rigid-tetris-physics`.
//!
//! # Module Structure
//!
//! - [`catalog`]: the seven piece archetypes (block offsets and colours)
//! - [`config`]: every tunable threshold, loadable from JSON
//! - [`game`]: per-tick orchestration, the public entry point
//! - [`lifecycle`]: spawning, steering and settling the active piece
//! - [`pile`]: aggregate pile state, rest detection and idle recovery
//! - [`cluster`]: same-kind connected-component detection
//! - [`progression`]: scoring, levels and the minimum cluster size
//! - [`session`]: phase machine (pause, level-up, game over)
//! - [`scheduler`]: deferred tasks guarded by a restart epoch
//!
//! # Example
//!
//! ```
//! use rigid_tetris_core::{EngineConfig, Game, KinematicWorld, MemoryHighScore};
//! use rigid_tetris_types::Intent;
//!
//! let cfg = EngineConfig::default();
//! let world = KinematicWorld::new(&cfg.field);
//! let mut game = Game::new(cfg, world, MemoryHighScore::default(), 12345);
//! game.start();
//!
//! game.apply_intent(Intent::MoveLeft, true);
//! for _ in 0..120 {
//!     game.tick(16);
//! }
//! assert!(game.score() > 0); // the first piece has landed
//! ```
//!
//! # Timing
//!
//! Call [`Game::tick`] every frame with the elapsed milliseconds
//! ([`types::TICK_MS`] is the nominal frame). Deferred work such as the next
//! spawn runs at the top of the first tick at or after its due time.

pub mod catalog;
pub mod cluster;
pub mod config;
pub mod game;
pub mod highscore;
pub mod kinematic;
pub mod lifecycle;
pub mod physics;
pub mod piece;
pub mod pile;
pub mod progression;
pub mod rng;
pub mod scheduler;
pub mod session;
pub mod snapshot;

pub use rigid_tetris_types as types;

// Re-export commonly used types for convenience
pub use catalog::{archetype, local_offsets, Archetype, Rgb};
pub use cluster::{ClearGroup, ClearPlan};
pub use config::{EngineConfig, Material};
pub use game::Game;
pub use highscore::{HighScoreStore, JsonFileHighScore, MemoryHighScore};
pub use kinematic::KinematicWorld;
pub use physics::{BlockId, BodyId, CompoundDesc, CompoundHandle, PhysicsWorld};
pub use piece::{Piece, PieceId, PieceState};
pub use rng::{PieceSelector, SimpleRng};
pub use session::GameSession;
pub use snapshot::{GameSnapshot, PieceSnapshot};
