//! Piece lifecycle controller - spawning, steering and settling the active piece
//!
//! At most one piece is active. It is created by [`LifecycleController::spawn`],
//! steered every tick by [`LifecycleController::apply_input`], and handed over
//! to the pile exactly once by [`LifecycleController::settle_check`]. Only this
//! controller ever clears the active reference.

use crate::catalog::local_offsets;
use crate::config::EngineConfig;
use crate::physics::{BodyId, CompoundDesc, PhysicsWorld};
use crate::piece::{Piece, PieceId, PieceRegistry, PieceState};
use crate::rng::PieceSelector;
use crate::types::{Intent, PieceKind, Vec2};

/// Movement intents currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldInput {
    pub left: bool,
    pub right: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub soft_drop: bool,
}

impl HeldInput {
    pub fn set(&mut self, intent: Intent, pressed: bool) {
        match intent {
            Intent::MoveLeft => self.left = pressed,
            Intent::MoveRight => self.right = pressed,
            Intent::RotateLeft => self.rotate_left = pressed,
            Intent::RotateRight => self.rotate_right = pressed,
            Intent::SoftDrop => self.soft_drop = pressed,
            Intent::HardDrop | Intent::PauseToggle | Intent::Restart => {}
        }
    }

    /// -1, 0 or 1; opposing keys cancel
    pub fn horizontal(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }

    /// -1 (counter-clockwise on screen), 0 or 1
    pub fn rotation(&self) -> f32 {
        (self.rotate_right as i8 - self.rotate_left as i8) as f32
    }
}

/// Which settle condition fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    /// Slow and touching the pile or a boundary
    Resting,
    /// No meaningful displacement for the stagnation timeout, clear of the spawn area
    Stagnant,
    /// Descended past the near-floor line
    PastFloorLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(PieceId, PieceKind),
    /// A settled, near-stationary piece occupies the spawn zone
    Blocked,
    /// Precondition failed (piece already active); nothing happened
    Skipped,
}

#[derive(Debug, Clone)]
pub struct LifecycleController {
    active: Option<PieceId>,
    input: HeldInput,
    hard_drop: bool,
    selector: PieceSelector,
}

/// Settled bodies plus the floor and walls
fn contact_candidates<W: PhysicsWorld>(registry: &PieceRegistry, world: &W) -> Vec<BodyId> {
    let mut candidates = registry.settled_bodies();
    candidates.extend_from_slice(world.boundaries());
    candidates
}

/// Whether a settled, near-stationary piece sits in the spawn exclusion zone.
pub fn spawn_blocked<W: PhysicsWorld>(
    registry: &PieceRegistry,
    world: &W,
    cfg: &EngineConfig,
) -> bool {
    registry.settled().any(|p| {
        let Some(pos) = world.position(p.body) else {
            return false;
        };
        pos.y < cfg.pile.spawn_exclusion_y
            && world.speed(p.body) < cfg.pile.spawn_block_speed
            && (pos.x - cfg.field.spawn_x).abs() <= cfg.pile.spawn_window_half_width
    })
}

impl LifecycleController {
    pub fn new(seed: u32) -> Self {
        Self {
            active: None,
            input: HeldInput::default(),
            hard_drop: false,
            selector: PieceSelector::new(seed),
        }
    }

    pub fn active(&self) -> Option<PieceId> {
        self.active
    }

    pub fn input(&self) -> HeldInput {
        self.input
    }

    /// Record a held intent. A hard drop latches until the piece settles.
    pub fn set_intent(&mut self, intent: Intent, pressed: bool) {
        if intent == Intent::HardDrop {
            if pressed && self.active.is_some() {
                self.hard_drop = true;
            }
            return;
        }
        self.input.set(intent, pressed);
    }

    /// Forget the active piece and held input, and rewind the piece sequence
    /// to its seed (session restart).
    pub fn reset(&mut self) {
        self.active = None;
        self.input = HeldInput::default();
        self.hard_drop = false;
        self.selector.reset();
    }

    pub fn spawn<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        registry: &mut PieceRegistry,
        now_ms: u64,
        cfg: &EngineConfig,
    ) -> SpawnOutcome {
        if self.active.is_some() {
            return SpawnOutcome::Skipped;
        }
        if spawn_blocked(registry, world, cfg) {
            return SpawnOutcome::Blocked;
        }

        let kind = self.selector.next();
        let offsets = local_offsets(kind, cfg.field.block_size);
        let spawn_at = cfg.field.spawn_point();
        let handle = world.spawn_compound(&CompoundDesc {
            position: spawn_at,
            blocks: &offsets,
            block_size: cfg.field.block_size,
            material: cfg.material,
        });

        let id = registry.next_id();
        registry.insert(Piece {
            id,
            kind,
            state: PieceState::Active,
            body: handle.body,
            blocks: handle.blocks,
            last_stable_position: spawn_at,
            last_stable_ms: now_ms,
            spawned_ms: now_ms,
        });
        self.active = Some(id);
        self.hard_drop = false;
        log::debug!("Spawned piece {} ({})", id.0, kind.as_str());
        SpawnOutcome::Spawned(id, kind)
    }

    /// Steer the active piece for this tick.
    pub fn apply_input<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        registry: &PieceRegistry,
        cfg: &EngineConfig,
    ) {
        let Some(body) = self.active.and_then(|id| registry.get(id)).map(|p| p.body) else {
            return;
        };
        let Some(velocity) = world.velocity(body) else {
            return;
        };
        let ctl = &cfg.control;

        let vx = self.input.horizontal() * ctl.move_speed;
        let vy = if self.hard_drop {
            if world.in_contact(body, &contact_candidates(registry, world)) {
                ctl.hard_drop_contact_speed
            } else {
                ctl.hard_drop_speed
            }
        } else if self.input.soft_drop {
            ctl.soft_drop_speed
        } else {
            velocity.y
        };
        world.set_velocity(body, Vec2::new(vx, vy));

        let turn = self.input.rotation();
        if turn != 0.0 {
            world.rotate(body, turn * ctl.rotation_step);
        }

        self.clamp_to_field(world, body, cfg);
    }

    /// Snap the piece back inside the side walls.
    fn clamp_to_field<W: PhysicsWorld>(&self, world: &mut W, body: BodyId, cfg: &EngineConfig) {
        let blocks = world.block_positions(body);
        if blocks.is_empty() {
            return;
        }
        let half = cfg.field.block_size / 2.0;
        let left = blocks.iter().map(|b| b.x - half).fold(f32::MAX, f32::min);
        let right = blocks.iter().map(|b| b.x + half).fold(f32::MIN, f32::max);

        let shift = if left < 0.0 {
            -left
        } else if right > cfg.field.width {
            cfg.field.width - right
        } else {
            return;
        };
        if let Some(pos) = world.position(body) {
            world.set_position(body, Vec2::new(pos.x + shift, pos.y));
        }
    }

    /// Run the settle heuristic. On transition the piece is relabelled
    /// settled and the active reference is cleared before returning.
    pub fn settle_check<W: PhysicsWorld>(
        &mut self,
        world: &W,
        registry: &mut PieceRegistry,
        now_ms: u64,
        cfg: &EngineConfig,
    ) -> Option<(PieceId, SettleReason)> {
        let id = self.active?;
        let Some(body) = registry.get(id).map(|p| p.body) else {
            log::warn!("Active piece {} missing from registry", id.0);
            self.active = None;
            return None;
        };
        let pos = world.position(body)?;
        let speed = world.speed(body);
        let touching = world.in_contact(body, &contact_candidates(registry, world));

        let piece = registry.get_mut(id)?;
        if pos.distance(piece.last_stable_position) > cfg.settle.motion_threshold {
            piece.last_stable_position = pos;
            piece.last_stable_ms = now_ms;
        }

        let stagnant_ms = now_ms.saturating_sub(piece.last_stable_ms);
        let clear_of_spawn = pos.y > cfg.field.spawn_y + cfg.settle.spawn_clearance;

        let reason = if speed < cfg.settle.settle_speed && touching {
            SettleReason::Resting
        } else if stagnant_ms > cfg.settle.stagnation_ms && clear_of_spawn {
            SettleReason::Stagnant
        } else if pos.y > cfg.floor_line() {
            SettleReason::PastFloorLine
        } else {
            return None;
        };

        piece.state = PieceState::Settled;
        self.active = None;
        self.hard_drop = false;
        match reason {
            SettleReason::Resting => log::debug!("Piece {} settled", id.0),
            _ => log::warn!("Piece {} settled by fallback ({reason:?})", id.0),
        }
        Some((id, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic::KinematicWorld;

    fn setup() -> (EngineConfig, KinematicWorld, PieceRegistry, LifecycleController) {
        let cfg = EngineConfig::default();
        let world = KinematicWorld::new(&cfg.field);
        (cfg, world, PieceRegistry::new(), LifecycleController::new(7))
    }

    #[test]
    fn held_input_axes() {
        let mut input = HeldInput::default();
        input.set(Intent::MoveLeft, true);
        assert_eq!(input.horizontal(), -1.0);
        input.set(Intent::MoveRight, true);
        assert_eq!(input.horizontal(), 0.0);
        input.set(Intent::MoveLeft, false);
        assert_eq!(input.horizontal(), 1.0);
        input.set(Intent::RotateLeft, true);
        assert_eq!(input.rotation(), -1.0);
    }

    #[test]
    fn spawn_twice_is_a_no_op() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        assert!(matches!(
            ctl.spawn(&mut world, &mut registry, 0, &cfg),
            SpawnOutcome::Spawned(..)
        ));
        assert_eq!(ctl.spawn(&mut world, &mut registry, 0, &cfg), SpawnOutcome::Skipped);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn spawned_piece_sits_at_spawn_point() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        let SpawnOutcome::Spawned(id, _) = ctl.spawn(&mut world, &mut registry, 5, &cfg) else {
            panic!("spawn failed");
        };
        let piece = registry.get(id).unwrap();
        assert_eq!(world.position(piece.body), Some(cfg.field.spawn_point()));
        assert_eq!(piece.spawned_ms, 5);
        assert_eq!(piece.last_stable_ms, 5);
        assert_eq!(piece.state, PieceState::Active);
    }

    #[test]
    fn horizontal_velocity_does_not_accumulate() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        ctl.spawn(&mut world, &mut registry, 0, &cfg);
        let body = registry.get(ctl.active().unwrap()).unwrap().body;

        ctl.set_intent(Intent::MoveRight, true);
        for _ in 0..5 {
            ctl.apply_input(&mut world, &registry, &cfg);
            world.step(0.016);
        }
        assert_eq!(world.velocity(body).unwrap().x, cfg.control.move_speed);

        ctl.set_intent(Intent::MoveRight, false);
        ctl.apply_input(&mut world, &registry, &cfg);
        assert_eq!(world.velocity(body).unwrap().x, 0.0);
    }

    #[test]
    fn hard_drop_latches_until_settle() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        ctl.spawn(&mut world, &mut registry, 0, &cfg);
        let body = registry.get(ctl.active().unwrap()).unwrap().body;

        ctl.set_intent(Intent::HardDrop, true);
        ctl.set_intent(Intent::HardDrop, false);
        ctl.apply_input(&mut world, &registry, &cfg);
        assert_eq!(world.velocity(body).unwrap().y, cfg.control.hard_drop_speed);
    }

    #[test]
    fn hard_drop_slows_once_touching_the_pile() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        let block = cfg.field.block_size;
        let base = Vec2::new(180.0, cfg.field.height - block / 2.0);
        let offsets = local_offsets(PieceKind::I, block);
        let handle = world.spawn_compound(&CompoundDesc {
            position: base,
            blocks: &offsets,
            block_size: block,
            material: cfg.material,
        });
        let id = registry.next_id();
        registry.insert(Piece {
            id,
            kind: PieceKind::I,
            state: PieceState::Settled,
            body: handle.body,
            blocks: handle.blocks,
            last_stable_position: base,
            last_stable_ms: 0,
            spawned_ms: 0,
        });

        ctl.spawn(&mut world, &mut registry, 0, &cfg);
        let body = registry.get(ctl.active().unwrap()).unwrap().body;
        ctl.set_intent(Intent::HardDrop, true);
        ctl.apply_input(&mut world, &registry, &cfg);
        assert_eq!(world.velocity(body).unwrap().y, cfg.control.hard_drop_speed);

        // Lowest blocks flush with the top of the I.
        let pile_top = cfg.field.height - block;
        let bottom = world
            .block_positions(body)
            .iter()
            .map(|b| b.y + block / 2.0)
            .fold(f32::MIN, f32::max);
        let pos = world.position(body).unwrap();
        world.set_position(body, Vec2::new(pos.x, pos.y + pile_top - bottom));

        ctl.apply_input(&mut world, &registry, &cfg);
        assert_eq!(
            world.velocity(body).unwrap().y,
            cfg.control.hard_drop_contact_speed
        );
    }

    #[test]
    fn reset_rewinds_the_piece_sequence() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        let mut kinds = Vec::new();
        for _ in 0..4 {
            if let SpawnOutcome::Spawned(id, kind) = ctl.spawn(&mut world, &mut registry, 0, &cfg) {
                kinds.push(kind);
                registry.remove(id);
            }
            ctl.reset();
        }
        assert!(kinds.iter().all(|k| *k == kinds[0]));
    }

    #[test]
    fn piece_is_snapped_back_inside_the_field() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        ctl.spawn(&mut world, &mut registry, 0, &cfg);
        let body = registry.get(ctl.active().unwrap()).unwrap().body;

        world.set_position(body, Vec2::new(-40.0, 300.0));
        ctl.apply_input(&mut world, &registry, &cfg);

        let half = cfg.field.block_size / 2.0;
        let left = world
            .block_positions(body)
            .iter()
            .map(|b| b.x - half)
            .fold(f32::MAX, f32::min);
        assert!(left.abs() < 1e-3, "left edge {}", left);
    }

    #[test]
    fn settles_on_the_floor_exactly_once() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        ctl.spawn(&mut world, &mut registry, 0, &cfg);

        let mut settled = Vec::new();
        let mut now = 0;
        for _ in 0..400 {
            now += 16;
            ctl.apply_input(&mut world, &registry, &cfg);
            world.step(0.016);
            if let Some(s) = ctl.settle_check(&world, &mut registry, now, &cfg) {
                settled.push(s);
            }
        }
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].1, SettleReason::Resting);
        assert!(ctl.active().is_none());
        assert_eq!(registry.settled_count(), 1);
    }

    #[test]
    fn stagnant_piece_near_spawn_does_not_settle() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        world.set_gravity(0.0);
        ctl.spawn(&mut world, &mut registry, 0, &cfg);

        let later = cfg.settle.stagnation_ms * 3;
        assert!(ctl.settle_check(&world, &mut registry, later, &cfg).is_none());
        assert!(ctl.active().is_some());
    }

    #[test]
    fn stagnant_piece_below_spawn_area_settles() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        world.set_gravity(0.0);
        ctl.spawn(&mut world, &mut registry, 0, &cfg);
        let id = ctl.active().unwrap();
        let body = registry.get(id).unwrap().body;

        world.set_position(body, Vec2::new(180.0, 400.0));
        assert!(ctl.settle_check(&world, &mut registry, 16, &cfg).is_none());
        let later = 16 + cfg.settle.stagnation_ms + 1;
        assert_eq!(
            ctl.settle_check(&world, &mut registry, later, &cfg),
            Some((id, SettleReason::Stagnant))
        );
    }

    #[test]
    fn spawn_zone_occupant_blocks_spawn() {
        let (cfg, mut world, mut registry, mut ctl) = setup();
        ctl.spawn(&mut world, &mut registry, 0, &cfg);
        let id = ctl.active().unwrap();
        registry.get_mut(id).unwrap().state = PieceState::Settled;
        ctl.reset();

        assert_eq!(ctl.spawn(&mut world, &mut registry, 0, &cfg), SpawnOutcome::Blocked);
    }
}
