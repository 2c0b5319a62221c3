//! Kinematic world - a small deterministic physics backend
//!
//! Blocks are treated as axis-aligned squares (rotation moves block centres but
//! never tilts the squares). Bodies fall under gravity, stop against whatever
//! they would penetrate, lose horizontal speed to friction while grounded, and
//! fall asleep when grounded and slower than their material's sleep threshold.
//! A sleeping body stays put until something wakes it, exactly the behaviour
//! the cluster-clear wake pass exists for.
//!
//! Same inputs, same trace: iteration is always in creation order.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;

use crate::config::FieldConfig;
use crate::physics::{BlockId, BlockPositions, BodyId, CompoundDesc, CompoundHandle, PhysicsWorld};
use crate::types::{Vec2, MAX_BLOCKS};

/// Overlap allowed before two shapes count as penetrating
const PENETRATION_SLOP: f32 = 0.01;

/// Gap still reported as contact
const CONTACT_SLOP: f32 = 0.5;

/// Bisection rounds when a move is blocked part-way
const SWEEP_ITERATIONS: u32 = 12;

const WALL_THICKNESS: f32 = 100.0;

#[derive(Debug, Clone)]
struct KinematicBody {
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    angvel: f32,
    /// Block id and centre relative to the body origin
    blocks: ArrayVec<(BlockId, Vec2), MAX_BLOCKS>,
    /// Half extents shared by every block of the body
    half: Vec2,
    fixed: bool,
    sleeping: bool,
    friction: f32,
    sleep_threshold: f32,
}

impl KinematicBody {
    fn rects_at(&self, position: Vec2, angle: f32) -> ArrayVec<Vec2, MAX_BLOCKS> {
        self.blocks
            .iter()
            .map(|&(_, local)| position + local.rotated(angle))
            .collect()
    }

    fn rects(&self) -> ArrayVec<Vec2, MAX_BLOCKS> {
        self.rects_at(self.position, self.angle)
    }
}

fn rects_overlap(a: Vec2, a_half: Vec2, b: Vec2, b_half: Vec2, slack: f32) -> bool {
    (a.x - b.x).abs() < a_half.x + b_half.x + slack && (a.y - b.y).abs() < a_half.y + b_half.y + slack
}

#[derive(Debug, Clone)]
pub struct KinematicWorld {
    bodies: BTreeMap<BodyId, KinematicBody>,
    boundaries: Vec<BodyId>,
    gravity: f32,
    next_id: u64,
}

impl KinematicWorld {
    /// World with floor and side walls enclosing the field.
    pub fn new(field: &FieldConfig) -> Self {
        let mut world = Self {
            bodies: BTreeMap::new(),
            boundaries: Vec::new(),
            gravity: field.gravity,
            next_id: 0,
        };

        let t = WALL_THICKNESS;
        let (w, h) = (field.width, field.height);
        // Floor, left wall, right wall.
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

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_fixed(&mut self, center: Vec2, half: Vec2) -> BodyId {
        let body = BodyId(self.alloc_id());
        let block = BlockId(self.alloc_id());
        let mut blocks = ArrayVec::new();
        blocks.push((block, Vec2::ZERO));
        self.bodies.insert(
            body,
            KinematicBody {
                position: center,
                angle: 0.0,
                velocity: Vec2::ZERO,
                angvel: 0.0,
                blocks,
                half,
                fixed: true,
                sleeping: true,
                friction: 1.0,
                sleep_threshold: 0.0,
            },
        );
        body
    }

    /// Whether `id` placed at `position`/`angle` would penetrate another body.
    fn blocked(&self, id: BodyId, position: Vec2, angle: f32) -> bool {
        let Some(body) = self.bodies.get(&id) else {
            return false;
        };
        let rects = body.rects_at(position, angle);
        self.bodies.iter().filter(|(other, _)| **other != id).any(|(_, other)| {
            let others = other.rects();
            rects.iter().any(|&a| {
                others
                    .iter()
                    .any(|&b| rects_overlap(a, body.half, b, other.half, -PENETRATION_SLOP))
            })
        })
    }

    /// Largest fraction of `delta` the body can travel without penetrating.
    fn sweep(&self, id: BodyId, position: Vec2, angle: f32, delta: Vec2) -> f32 {
        if !self.blocked(id, position + delta, angle) {
            return 1.0;
        }
        // Interpenetrating bodies separate freely.
        if self.blocked(id, position, angle) {
            return 1.0;
        }
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        for _ in 0..SWEEP_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            if self.blocked(id, position + delta.scale(mid), angle) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        lo
    }

    fn step_body(&mut self, id: BodyId, dt: f32) {
        let Some(body) = self.bodies.get(&id) else {
            return;
        };
        if body.fixed || body.sleeping {
            return;
        }

        let mut position = body.position;
        let mut angle = body.angle;
        let mut velocity = body.velocity;
        let mut angvel = body.angvel;
        let friction = body.friction;
        let sleep_threshold = body.sleep_threshold;

        velocity.y += self.gravity * dt;

        if angvel != 0.0 {
            let turned = angle + angvel * dt;
            if self.blocked(id, position, turned) && !self.blocked(id, position, angle) {
                angvel = 0.0;
            } else {
                angle = turned;
            }
        }

        let dx = Vec2::new(velocity.x * dt, 0.0);
        let fx = self.sweep(id, position, angle, dx);
        position = position + dx.scale(fx);
        if fx < 1.0 {
            velocity.x = 0.0;
        }

        let dy = Vec2::new(0.0, velocity.y * dt);
        let fy = self.sweep(id, position, angle, dy);
        position = position + dy.scale(fy);
        let grounded = fy < 1.0 && velocity.y >= 0.0;
        if fy < 1.0 {
            velocity.y = 0.0;
        }

        if grounded {
            velocity.x *= (1.0 - friction).max(0.0);
            angvel *= (1.0 - friction).max(0.0);
        }

        let Some(body) = self.bodies.get_mut(&id) else {
            return;
        };
        body.position = position;
        body.angle = angle;
        body.velocity = velocity;
        body.angvel = angvel;
        if grounded && velocity.length() < sleep_threshold && angvel.abs() < 1e-3 {
            body.sleeping = true;
            body.velocity = Vec2::ZERO;
            body.angvel = 0.0;
        }
    }

    /// Put a body to sleep in place.
    pub fn sleep(&mut self, body: BodyId) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if !b.fixed {
                b.sleeping = true;
                b.velocity = Vec2::ZERO;
                b.angvel = 0.0;
            }
        }
    }

    pub fn angle(&self, body: BodyId) -> Option<f32> {
        self.bodies.get(&body).map(|b| b.angle)
    }
}

impl PhysicsWorld for KinematicWorld {
    fn spawn_compound(&mut self, desc: &CompoundDesc<'_>) -> CompoundHandle {
        let body = BodyId(self.alloc_id());
        let mut blocks = ArrayVec::new();
        let mut handles = ArrayVec::new();
        for &local in desc.blocks.iter().take(MAX_BLOCKS) {
            let block = BlockId(self.alloc_id());
            blocks.push((block, local));
            handles.push(block);
        }
        let half = desc.block_size / 2.0;
        self.bodies.insert(
            body,
            KinematicBody {
                position: desc.position,
                angle: 0.0,
                velocity: Vec2::ZERO,
                angvel: 0.0,
                blocks,
                half: Vec2::new(half, half),
                fixed: false,
                sleeping: false,
                friction: desc.material.friction,
                sleep_threshold: desc.material.sleep_threshold,
            },
        );
        CompoundHandle {
            body,
            blocks: handles,
        }
    }

    fn step(&mut self, dt: f32) {
        let ids: Vec<BodyId> = self.bodies.keys().copied().collect();
        for id in ids {
            self.step_body(id, dt);
        }
    }

    fn position(&self, body: BodyId) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn velocity(&self, body: BodyId) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn angular_velocity(&self, body: BodyId) -> Option<f32> {
        self.bodies.get(&body).map(|b| b.angvel)
    }

    fn set_position(&mut self, body: BodyId, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if !b.fixed {
                b.position = position;
                b.sleeping = false;
            }
        }
    }

    fn set_velocity(&mut self, body: BodyId, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if !b.fixed {
                b.velocity = velocity;
                b.sleeping = false;
            }
        }
    }

    fn set_angular_velocity(&mut self, body: BodyId, angvel: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if !b.fixed {
                b.angvel = angvel;
                b.sleeping = false;
            }
        }
    }

    fn rotate(&mut self, body: BodyId, delta: f32) {
        let Some(b) = self.bodies.get(&body) else {
            return;
        };
        if b.fixed {
            return;
        }
        let (position, turned) = (b.position, b.angle + delta);
        if self.blocked(body, position, turned) {
            return;
        }
        if let Some(b) = self.bodies.get_mut(&body) {
            b.angle = turned;
            b.sleeping = false;
        }
    }

    fn is_sleeping(&self, body: BodyId) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.sleeping)
    }

    fn wake(&mut self, body: BodyId) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if !b.fixed {
                b.sleeping = false;
            }
        }
    }

    fn in_contact(&self, body: BodyId, candidates: &[BodyId]) -> bool {
        let Some(a) = self.bodies.get(&body) else {
            return false;
        };
        let rects = a.rects();
        candidates
            .iter()
            .filter(|&&c| c != body)
            .filter_map(|c| self.bodies.get(c))
            .any(|b| {
                let others = b.rects();
                rects.iter().any(|&ra| {
                    others
                        .iter()
                        .any(|&rb| rects_overlap(ra, a.half, rb, b.half, CONTACT_SLOP))
                })
            })
    }

    fn block_positions(&self, body: BodyId) -> BlockPositions {
        self.bodies
            .get(&body)
            .map(KinematicBody::rects)
            .unwrap_or_default()
    }

    fn remove(&mut self, body: BodyId) {
        if self.boundaries.contains(&body) {
            return;
        }
        self.bodies.remove(&body);
    }

    fn bodies(&self) -> Vec<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, b)| !b.fixed)
            .map(|(id, _)| *id)
            .collect()
    }

    fn boundaries(&self) -> &[BodyId] {
        &self.boundaries
    }
}
