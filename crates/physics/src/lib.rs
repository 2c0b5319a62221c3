//! Rapier-backed physics world
//!
//! Implements [`PhysicsWorld`] on top of rapier2d. Each piece is one dynamic
//! rigid body with one cuboid collider per block; the floor and side walls are
//! fixed bodies. World units are field pixels with `y` growing downward, so
//! gravity is a positive `y` vector.
//!
//! ```no_run
//! use rigid_tetris_core::{EngineConfig, Game, MemoryHighScore};
//! use rigid_tetris_physics::RapierWorld;
//!
//! let cfg = EngineConfig::default();
//! let world = RapierWorld::new(&cfg.field);
//! let mut game = Game::new(cfg, world, MemoryHighScore::default(), 7);
//! game.start();
//! game.tick(16);
//! ```

use std::collections::BTreeMap;

use arrayvec::ArrayVec;
use rapier2d::na::UnitComplex;
use rapier2d::prelude::*;
use rigid_tetris_core::config::FieldConfig;
use rigid_tetris_core::physics::{
    BlockId, BlockPositions, BodyId, CompoundDesc, CompoundHandle, PhysicsWorld,
};
use rigid_tetris_types::{Vec2, MAX_BLOCKS};

const WALL_THICKNESS: f32 = 100.0;

struct Tracked {
    handle: RigidBodyHandle,
    /// Block id and centre relative to the body origin
    blocks: ArrayVec<(BlockId, Vec2), MAX_BLOCKS>,
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    tracked: BTreeMap<BodyId, Tracked>,
    boundaries: Vec<BodyId>,
    next_id: u64,
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

impl RapierWorld {
    /// World with floor and side walls enclosing the field.
    pub fn new(field: &FieldConfig) -> Self {
        let mut world = Self {
            gravity: vector![0.0, field.gravity],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            tracked: BTreeMap::new(),
            boundaries: Vec::new(),
            next_id: 0,
        };

        let t = WALL_THICKNESS;
        let (w, h) = (field.width, field.height);
        for (center, half) in [
            (Vec2::new(w / 2.0, h + t / 2.0), Vec2::new(w / 2.0 + t, t / 2.0)),
            (Vec2::new(-t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0 + t)),
            (Vec2::new(w + t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0 + t)),
        ] {
            let id = world.add_fixed(center, half);
            world.boundaries.push(id);
        }
        world
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_fixed(&mut self, center: Vec2, half: Vec2) -> BodyId {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![center.x, center.y])
            .build();
        let handle = self.rigid_bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half.x, half.y).friction(1.0).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.rigid_bodies);

        let id = BodyId(self.alloc_id());
        let mut blocks = ArrayVec::new();
        blocks.push((BlockId(self.alloc_id()), Vec2::ZERO));
        self.tracked.insert(id, Tracked { handle, blocks });
        id
    }

    fn body(&self, id: BodyId) -> Option<&RigidBody> {
        let tracked = self.tracked.get(&id)?;
        self.rigid_bodies.get(tracked.handle)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let tracked = self.tracked.get(&id)?;
        self.rigid_bodies
            .get_mut(tracked.handle)
            .filter(|rb| rb.is_dynamic())
    }

    fn collider_handles(&self, id: BodyId) -> &[ColliderHandle] {
        self.body(id).map(|rb| rb.colliders()).unwrap_or(&[])
    }

    pub fn angle(&self, id: BodyId) -> Option<f32> {
        self.body(id).map(|rb| rb.rotation().angle())
    }

    pub fn body_count(&self) -> usize {
        self.rigid_bodies.len()
    }
}

impl PhysicsWorld for RapierWorld {
    fn spawn_compound(&mut self, desc: &CompoundDesc<'_>) -> CompoundHandle {
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![desc.position.x, desc.position.y])
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_bodies.insert(rb);
        if let Some(rb) = self.rigid_bodies.get_mut(handle) {
            rb.activation_mut().linear_threshold = desc.material.sleep_threshold;
        }

        let half = desc.block_size / 2.0;
        let mut blocks = ArrayVec::new();
        let mut ids = ArrayVec::new();
        for &local in desc.blocks.iter().take(MAX_BLOCKS) {
            let collider = ColliderBuilder::cuboid(half, half)
                .translation(vector![local.x, local.y])
                .friction(desc.material.friction)
                .restitution(desc.material.restitution)
                .density(desc.material.density)
                .build();
            self.colliders
                .insert_with_parent(collider, handle, &mut self.rigid_bodies);
            let block = BlockId(self.alloc_id());
            blocks.push((block, local));
            ids.push(block);
        }

        let body = BodyId(self.alloc_id());
        self.tracked.insert(body, Tracked { handle, blocks });
        log::debug!("compound body {} added with {} blocks", body.0, ids.len());
        CompoundHandle { body, blocks: ids }
    }

    fn step(&mut self, dt: f32) {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
    }

    fn position(&self, body: BodyId) -> Option<Vec2> {
        self.body(body).map(|rb| to_vec2(rb.translation()))
    }

    fn velocity(&self, body: BodyId) -> Option<Vec2> {
        self.body(body).map(|rb| to_vec2(rb.linvel()))
    }

    fn angular_velocity(&self, body: BodyId) -> Option<f32> {
        self.body(body).map(|rb| rb.angvel())
    }

    fn set_position(&mut self, body: BodyId, position: Vec2) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_translation(vector![position.x, position.y], true);
        }
    }

    fn set_velocity(&mut self, body: BodyId, velocity: Vec2) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    fn set_angular_velocity(&mut self, body: BodyId, angvel: f32) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_angvel(angvel, true);
        }
    }

    fn rotate(&mut self, body: BodyId, delta: f32) {
        if let Some(rb) = self.body_mut(body) {
            let turned = rb.rotation().angle() + delta;
            rb.set_rotation(UnitComplex::new(turned), true);
        }
    }

    fn is_sleeping(&self, body: BodyId) -> bool {
        self.body(body).is_some_and(|rb| rb.is_sleeping())
    }

    fn wake(&mut self, body: BodyId) {
        if let Some(rb) = self.body_mut(body) {
            rb.wake_up(true);
        }
    }

    fn in_contact(&self, body: BodyId, candidates: &[BodyId]) -> bool {
        let mine = self.collider_handles(body);
        candidates
            .iter()
            .filter(|&&c| c != body)
            .flat_map(|&c| self.collider_handles(c))
            .any(|&other| {
                mine.iter().any(|&c| {
                    self.narrow_phase
                        .contact_pair(c, other)
                        .map_or(false, |pair| pair.has_any_active_contact)
                })
            })
    }

    /// Derived from the body pose, so it is current even before the next step.
    fn block_positions(&self, body: BodyId) -> BlockPositions {
        let (Some(tracked), Some(rb)) = (self.tracked.get(&body), self.body(body)) else {
            return BlockPositions::new();
        };
        let origin = to_vec2(rb.translation());
        let angle = rb.rotation().angle();
        tracked
            .blocks
            .iter()
            .map(|&(_, local)| origin + local.rotated(angle))
            .collect()
    }

    fn remove(&mut self, body: BodyId) {
        if self.boundaries.contains(&body) {
            return;
        }
        let Some(tracked) = self.tracked.remove(&body) else {
            return;
        };
        self.rigid_bodies.remove(
            tracked.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn bodies(&self) -> Vec<BodyId> {
        self.tracked
            .keys()
            .filter(|id| !self.boundaries.contains(id))
            .copied()
            .collect()
    }

    fn boundaries(&self) -> &[BodyId] {
        &self.boundaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigid_tetris_core::catalog::local_offsets;
    use rigid_tetris_core::config::{EngineConfig, Material};
    use rigid_tetris_types::PieceKind;

    fn spawn(world: &mut RapierWorld, kind: PieceKind, at: Vec2) -> BodyId {
        let offsets = local_offsets(kind, 30.0);
        world
            .spawn_compound(&CompoundDesc {
                position: at,
                blocks: &offsets,
                block_size: 30.0,
                material: Material::default(),
            })
            .body
    }

    fn run(world: &mut RapierWorld, steps: usize) {
        for _ in 0..steps {
            world.step(1.0 / 60.0);
        }
    }

    #[test]
    fn o_piece_comes_to_rest_on_the_floor() {
        let cfg = EngineConfig::default();
        let mut world = RapierWorld::new(&cfg.field);
        let body = spawn(&mut world, PieceKind::O, Vec2::new(180.0, 300.0));

        run(&mut world, 240);

        let pos = world.position(body).unwrap();
        assert!((pos.y - (cfg.field.height - 30.0)).abs() < 2.0, "rest y = {}", pos.y);
        assert!(world.speed(body) < cfg.settle.settle_speed);
        assert!(world.in_contact(body, world.boundaries()));
    }

    #[test]
    fn block_positions_follow_the_body() {
        let cfg = EngineConfig::default();
        let mut world = RapierWorld::new(&cfg.field);
        let body = spawn(&mut world, PieceKind::I, Vec2::new(180.0, 300.0));

        world.set_position(body, Vec2::new(100.0, 200.0));
        let blocks = world.block_positions(body);
        assert_eq!(blocks.len(), 4);
        let mean_x = blocks.iter().map(|b| b.x).sum::<f32>() / 4.0;
        assert!((mean_x - 100.0).abs() < 1e-3);
        assert!(blocks.iter().all(|b| (b.y - 200.0).abs() < 1e-3));
    }

    #[test]
    fn removal_leaves_boundaries_alone() {
        let cfg = EngineConfig::default();
        let mut world = RapierWorld::new(&cfg.field);
        let body = spawn(&mut world, PieceKind::T, Vec2::new(180.0, 300.0));
        assert_eq!(world.bodies(), vec![body]);

        world.remove(body);
        for &wall in world.boundaries().to_vec().iter() {
            world.remove(wall);
        }
        assert!(world.bodies().is_empty());
        assert_eq!(world.boundaries().len(), 3);
        assert_eq!(world.body_count(), 3);
        assert!(world.position(body).is_none());
    }

    #[test]
    fn setters_ignore_walls() {
        let cfg = EngineConfig::default();
        let mut world = RapierWorld::new(&cfg.field);
        let floor = world.boundaries()[0];
        let before = world.position(floor).unwrap();
        world.set_position(floor, Vec2::new(0.0, 0.0));
        assert_eq!(world.position(floor), Some(before));
    }
}
