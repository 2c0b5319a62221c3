//! Pieces and the piece registry
//!
//! A piece is one compound rigid body plus the ids of its blocks. The registry
//! keys pieces by [`PieceId`], which is assigned in creation order, so iterating
//! the registry is iterating in creation order.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;
use serde::Serialize;

use crate::physics::{BlockId, BodyId};
use crate::types::{PieceKind, Vec2, MAX_BLOCKS};

/// Monotonic piece id (creation order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PieceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceState {
    Active,
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceKind,
    pub state: PieceState,
    pub body: BodyId,
    pub blocks: ArrayVec<BlockId, MAX_BLOCKS>,
    pub last_stable_position: Vec2,
    pub last_stable_ms: u64,
    pub spawned_ms: u64,
}

impl Piece {
    pub fn is_settled(&self) -> bool {
        self.state == PieceState::Settled
    }
}

#[derive(Debug, Clone, Default)]
pub struct PieceRegistry {
    pieces: BTreeMap<PieceId, Piece>,
    next_id: u32,
}

impl PieceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> PieceId {
        self.next_id = self.next_id.wrapping_add(1);
        PieceId(self.next_id)
    }

    pub fn insert(&mut self, piece: Piece) {
        self.pieces.insert(piece.id, piece);
    }

    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(&id)
    }

    pub fn get_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(&id)
    }

    pub fn remove(&mut self, id: PieceId) -> Option<Piece> {
        self.pieces.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// All pieces in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    /// Settled pieces in creation order
    pub fn settled(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values().filter(|p| p.is_settled())
    }

    pub fn settled_count(&self) -> usize {
        self.settled().count()
    }

    pub fn active_count(&self) -> usize {
        self.pieces.values().filter(|p| !p.is_settled()).count()
    }

    pub fn settled_bodies(&self) -> Vec<BodyId> {
        self.settled().map(|p| p.body).collect()
    }

    pub fn clear(&mut self) {
        self.pieces.clear();
    }
}
