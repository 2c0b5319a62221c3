//! Shape catalog - the static table of piece archetypes
//!
//! Offsets are integer `(col, row)` grid units. They only become world
//! geometry when scaled by the block size and re-centred on the piece's
//! centroid, which is where the compound body's origin sits.

use arrayvec::ArrayVec;
use serde::Serialize;

use crate::types::{PieceKind, Vec2, MAX_BLOCKS};

/// Block offset in grid units
pub type GridOffset = (i8, i8);

/// Display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Immutable piece archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Archetype {
    pub kind: PieceKind,
    pub offsets: [GridOffset; MAX_BLOCKS],
    pub color: Rgb,
}

/// All archetypes, indexed by [`PieceKind::index`]
pub const CATALOG: [Archetype; 7] = [
    Archetype {
        kind: PieceKind::I,
        offsets: [(0, 0), (1, 0), (2, 0), (3, 0)],
        color: Rgb(0x4d, 0xd0, 0xe1),
    },
    Archetype {
        kind: PieceKind::O,
        offsets: [(0, 0), (1, 0), (0, 1), (1, 1)],
        color: Rgb(0xff, 0xd5, 0x4f),
    },
    Archetype {
        kind: PieceKind::T,
        offsets: [(0, 0), (1, 0), (2, 0), (1, 1)],
        color: Rgb(0xba, 0x68, 0xc8),
    },
    Archetype {
        kind: PieceKind::S,
        offsets: [(1, 0), (2, 0), (0, 1), (1, 1)],
        color: Rgb(0x81, 0xc7, 0x84),
    },
    Archetype {
        kind: PieceKind::Z,
        offsets: [(0, 0), (1, 0), (1, 1), (2, 1)],
        color: Rgb(0xe5, 0x73, 0x73),
    },
    Archetype {
        kind: PieceKind::J,
        offsets: [(0, 0), (0, 1), (1, 1), (2, 1)],
        color: Rgb(0x64, 0x8d, 0xf0),
    },
    Archetype {
        kind: PieceKind::L,
        offsets: [(2, 0), (0, 1), (1, 1), (2, 1)],
        color: Rgb(0xff, 0xb7, 0x4d),
    },
];

pub fn archetype(kind: PieceKind) -> &'static Archetype {
    &CATALOG[kind.index()]
}

/// Block centres relative to the piece centroid, in world units.
pub fn local_offsets(kind: PieceKind, block_size: f32) -> ArrayVec<Vec2, MAX_BLOCKS> {
    let offsets = &archetype(kind).offsets;
    let n = offsets.len() as f32;
    let cx = offsets.iter().map(|&(c, _)| c as f32).sum::<f32>() / n;
    let cy = offsets.iter().map(|&(_, r)| r as f32).sum::<f32>() / n;

    offsets
        .iter()
        .map(|&(c, r)| Vec2::new((c as f32 - cx) * block_size, (r as f32 - cy) * block_size))
        .collect()
}
