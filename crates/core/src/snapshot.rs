use arrayvec::ArrayVec;
use serde::Serialize;

use crate::catalog::{archetype, Rgb};
use crate::physics::BlockPositions;
use crate::piece::{PieceId, PieceState};
use crate::types::{Phase, PieceKind, Vec2, MAX_BLOCKS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieceSnapshot {
    pub id: PieceId,
    pub kind: PieceKind,
    pub color: Rgb,
    pub state: PieceState,
    pub position: Vec2,
    pub velocity: Vec2,
    pub blocks: ArrayVec<Vec2, MAX_BLOCKS>,
}

impl PieceSnapshot {
    pub fn new(
        id: PieceId,
        kind: PieceKind,
        state: PieceState,
        position: Vec2,
        velocity: Vec2,
        blocks: BlockPositions,
    ) -> Self {
        Self {
            id,
            kind,
            color: archetype(kind).color,
            state,
            position,
            velocity,
            blocks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PileSnapshot {
    pub settled: usize,
    pub moving: usize,
    pub height: f32,
    pub fill_percent: f32,
    pub danger: bool,
}

/// Read-only view of everything a presentation layer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub paused: bool,
    pub game_over: bool,
    pub shaking: bool,
    pub score: u32,
    pub high_score: u32,
    pub final_score: Option<u32>,
    pub level: u32,
    pub min_cluster: u32,
    pub now_ms: u64,
    pub epoch: u32,
    pub seed: u32,
    pub active: Option<PieceSnapshot>,
    /// Settled pieces in creation order
    pub pile: Vec<PieceSnapshot>,
    pub pile_stats: PileSnapshot,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::NotStarted,
            paused: false,
            game_over: false,
            shaking: false,
            score: 0,
            high_score: 0,
            final_score: None,
            level: 1,
            min_cluster: 0,
            now_ms: 0,
            epoch: 0,
            seed: 0,
            active: None,
            pile: Vec::new(),
            pile_stats: PileSnapshot::default(),
        }
    }
}

impl GameSnapshot {
    /// Reset in place, keeping the pile buffer's capacity.
    pub fn clear(&mut self) {
        let mut pile = std::mem::take(&mut self.pile);
        pile.clear();
        *self = Self {
            pile,
            ..Self::default()
        };
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
