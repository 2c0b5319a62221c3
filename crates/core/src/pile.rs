//! Pile monitor - aggregate state of the settled pieces
//!
//! The scan is a pure read of the world. [`monitor`] turns it into the two
//! decisions the game acts on: re-run clear detection when the pile comes to
//! rest, and force a spawn when nothing has happened for too long.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::physics::PhysicsWorld;
use crate::piece::PieceRegistry;
use crate::session::GameSession;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PileScan {
    pub settled: usize,
    /// Settled pieces faster than the still threshold
    pub moving: usize,
    /// Top edge of the highest settled block
    pub top_y: Option<f32>,
    pub height: f32,
    /// Height as a share of the usable height, clamped to [0, 100]
    pub fill_percent: f32,
}

impl PileScan {
    pub fn is_moving(&self) -> bool {
        self.moving > 0
    }

    pub fn is_danger(&self, cfg: &EngineConfig) -> bool {
        self.fill_percent >= cfg.pile.danger_percent
    }
}

pub fn scan<W: PhysicsWorld>(registry: &PieceRegistry, world: &W, cfg: &EngineConfig) -> PileScan {
    let half = cfg.field.block_size / 2.0;
    let mut out = PileScan::default();

    for piece in registry.settled() {
        out.settled += 1;
        if world.speed(piece.body) > cfg.pile.still_speed {
            out.moving += 1;
        }
        for block in world.block_positions(piece.body) {
            let top = block.y - half;
            out.top_y = Some(out.top_y.map_or(top, |t: f32| t.min(top)));
        }
    }

    if let Some(top) = out.top_y {
        out.height = (cfg.field.height - top).max(0.0);
        let usable = cfg.max_usable_height().max(f32::EPSILON);
        out.fill_percent = (out.height / usable * 100.0).clamp(0.0, 100.0);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PileDecision {
    /// The pile just went from moving to fully still
    pub came_to_rest: bool,
    /// Idle recovery: nothing active, nothing moving, nothing happening
    pub force_spawn: bool,
}

pub fn monitor(
    session: &mut GameSession,
    scan: &PileScan,
    has_active: bool,
    cfg: &EngineConfig,
) -> PileDecision {
    let moving = scan.is_moving();
    let came_to_rest = session.was_pile_moving && !moving;
    session.was_pile_moving = moving;

    let idle_ms = session.now_ms.saturating_sub(session.last_action_ms);
    let force_spawn = !has_active && !moving && idle_ms > cfg.pile.idle_spawn_ms;

    PileDecision {
        came_to_rest,
        force_spawn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> GameSession {
        let mut s = GameSession::new(0, 3);
        s.start();
        s
    }

    fn scan_with(moving: usize) -> PileScan {
        PileScan {
            settled: 4,
            moving,
            ..PileScan::default()
        }
    }

    #[test]
    fn rest_edge_fires_once() {
        let cfg = EngineConfig::default();
        let mut s = running();

        assert!(!monitor(&mut s, &scan_with(2), true, &cfg).came_to_rest);
        assert!(monitor(&mut s, &scan_with(0), true, &cfg).came_to_rest);
        assert!(!monitor(&mut s, &scan_with(0), true, &cfg).came_to_rest);
    }

    #[test]
    fn idle_spawn_needs_no_active_piece_and_a_still_pile() {
        let cfg = EngineConfig::default();
        let mut s = running();
        s.now_ms = cfg.pile.idle_spawn_ms + 1;

        assert!(!monitor(&mut s, &scan_with(0), true, &cfg).force_spawn);
        assert!(!monitor(&mut s, &scan_with(1), false, &cfg).force_spawn);
        assert!(monitor(&mut s, &scan_with(0), false, &cfg).force_spawn);
    }

    #[test]
    fn recent_action_suppresses_idle_spawn() {
        let cfg = EngineConfig::default();
        let mut s = running();
        s.now_ms = 10_000;
        s.touch();
        s.now_ms += cfg.pile.idle_spawn_ms;
        assert!(!monitor(&mut s, &scan_with(0), false, &cfg).force_spawn);
    }

    #[test]
    fn empty_pile_has_zero_fill() {
        let cfg = EngineConfig::default();
        let registry = PieceRegistry::new();
        let world = crate::kinematic::KinematicWorld::new(&cfg.field);
        let out = scan(&registry, &world, &cfg);
        assert_eq!(out.fill_percent, 0.0);
        assert_eq!(out.top_y, None);
        assert!(!out.is_danger(&cfg));
    }
}
