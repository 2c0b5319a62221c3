//! Rigid Tetris (workspace facade crate).
//!
//! Re-exports the member crates under short names so downstream code can use
//! `rigid_tetris::{core, physics, types}` without depending on each crate.

pub use rigid_tetris_core as core;
pub use rigid_tetris_physics as physics;
pub use rigid_tetris_types as types;
