//! Physics boundary - the rigid-body world the core drives but does not implement
//!
//! The core never integrates motion or resolves collisions itself. It spawns
//! compound bodies, nudges their velocity and pose, reads their state, and asks
//! contact questions. Two implementations ship with the workspace:
//!
//! - [`KinematicWorld`](crate::kinematic::KinematicWorld): deterministic,
//!   dependency-free, used by tests, benches and scripted setups
//! - `RapierWorld` in `rigid-tetris-physics`: the production backend

use arrayvec::ArrayVec;
use serde::Serialize;

use crate::config::Material;
use crate::types::{Vec2, MAX_BLOCKS};

/// Handle of a rigid body (a whole piece, or a boundary wall)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BodyId(pub u64);

/// Handle of one block (sub-shape) of a compound body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(pub u64);

/// World positions of a body's blocks
pub type BlockPositions = ArrayVec<Vec2, MAX_BLOCKS>;

/// Everything needed to create a compound piece body
#[derive(Debug, Clone, Copy)]
pub struct CompoundDesc<'a> {
    /// World position of the body origin (the piece centroid)
    pub position: Vec2,
    /// Block centres relative to the origin
    pub blocks: &'a [Vec2],
    pub block_size: f32,
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundHandle {
    pub body: BodyId,
    pub blocks: ArrayVec<BlockId, MAX_BLOCKS>,
}

/// Rigid-body world consumed by the core
///
/// Setters on unknown bodies are ignored and getters return `None`/empty, so
/// a stale handle never panics.
pub trait PhysicsWorld {
    /// Create one dynamic rigid body composed of square blocks.
    fn spawn_compound(&mut self, desc: &CompoundDesc<'_>) -> CompoundHandle;

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    fn position(&self, body: BodyId) -> Option<Vec2>;
    fn velocity(&self, body: BodyId) -> Option<Vec2>;
    fn angular_velocity(&self, body: BodyId) -> Option<f32>;

    fn set_position(&mut self, body: BodyId, position: Vec2);
    fn set_velocity(&mut self, body: BodyId, velocity: Vec2);
    fn set_angular_velocity(&mut self, body: BodyId, angvel: f32);

    /// Turn the body by `delta` radians about its origin.
    fn rotate(&mut self, body: BodyId, delta: f32);

    fn is_sleeping(&self, body: BodyId) -> bool;
    fn wake(&mut self, body: BodyId);

    /// Whether `body` currently touches any of `candidates`.
    fn in_contact(&self, body: BodyId, candidates: &[BodyId]) -> bool;

    fn block_positions(&self, body: BodyId) -> BlockPositions;

    /// Remove the body and all of its blocks.
    fn remove(&mut self, body: BodyId);

    /// All dynamic bodies, in creation order. Boundaries are not included.
    fn bodies(&self) -> Vec<BodyId>;

    /// Fixed floor and wall bodies.
    fn boundaries(&self) -> &[BodyId];

    /// Linear speed, zero for unknown bodies.
    fn speed(&self, body: BodyId) -> f32 {
        self.velocity(body).map_or(0.0, Vec2::length)
    }
}
