//! Cluster-clear engine - finds same-kind touching groups of settled pieces
//!
//! Two settled pieces of the same kind are adjacent if the physics world
//! reports contact between them, or if any block of one lies within the
//! proximity threshold of any block of the other. The fallback exists because
//! resting bodies routinely drift a sub-pixel apart and stop reporting contact.
//!
//! Planning and applying are separate steps: [`plan_clears`] reads a frozen
//! view of the pile (block positions are sampled once up front) and decides
//! everything, then the caller removes the whole plan at once.

use crate::config::ClearConfig;
use crate::physics::{BlockPositions, BodyId, PhysicsWorld};
use crate::piece::{PieceId, PieceRegistry};
use crate::progression::clear_points;
use crate::types::{PieceKind, Vec2};

/// Connected components of `nodes` under a symmetric `adjacent` predicate.
///
/// Deterministic for a given node order: components are listed by their
/// earliest node, and members keep the input order.
pub fn connected_components<T: Copy>(
    nodes: &[T],
    mut adjacent: impl FnMut(&T, &T) -> bool,
) -> Vec<Vec<T>> {
    let mut visited = vec![false; nodes.len()];
    let mut components = Vec::new();

    for start in 0..nodes.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut stack = vec![start];
        let mut members = Vec::new();

        while let Some(i) = stack.pop() {
            members.push(i);
            for j in 0..nodes.len() {
                if !visited[j] && adjacent(&nodes[i], &nodes[j]) {
                    visited[j] = true;
                    stack.push(j);
                }
            }
        }

        members.sort_unstable();
        components.push(members.into_iter().map(|i| nodes[i]).collect());
    }
    components
}

/// Whether any block of `a` lies within `threshold` of any block of `b`.
pub fn blocks_within(a: &[Vec2], b: &[Vec2], threshold: f32) -> bool {
    a.iter()
        .any(|&pa| b.iter().any(|&pb| pa.distance(pb) <= threshold))
}

/// One cluster slated for removal
#[derive(Debug, Clone, PartialEq)]
pub struct ClearGroup {
    pub kind: PieceKind,
    pub pieces: Vec<PieceId>,
    pub bodies: Vec<BodyId>,
    pub points: u32,
}

/// Everything one clear evaluation decided
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClearPlan {
    pub groups: Vec<ClearGroup>,
}

impl ClearPlan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn piece_count(&self) -> usize {
        self.groups.iter().map(|g| g.pieces.len()).sum()
    }

    pub fn points(&self) -> u32 {
        self.groups
            .iter()
            .fold(0u32, |acc, g| acc.saturating_add(g.points))
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    piece: PieceId,
    body: BodyId,
    blocks: &'a BlockPositions,
}

/// Decide which clusters clear, without touching the world.
pub fn plan_clears<W: PhysicsWorld>(
    registry: &PieceRegistry,
    world: &W,
    min_cluster: u32,
    proximity: f32,
    cfg: &ClearConfig,
) -> ClearPlan {
    // Sample the pile once so every adjacency decision sees the same state.
    let sampled: Vec<(PieceId, BodyId, PieceKind, BlockPositions)> = registry
        .settled()
        .map(|p| (p.id, p.body, p.kind, world.block_positions(p.body)))
        .collect();

    // Partition by kind, groups ordered by their earliest-created member.
    let mut partitions: Vec<(PieceKind, Vec<Candidate<'_>>)> = Vec::new();
    for (piece, body, kind, blocks) in &sampled {
        let candidate = Candidate {
            piece: *piece,
            body: *body,
            blocks,
        };
        match partitions.iter_mut().find(|(k, _)| k == kind) {
            Some((_, members)) => members.push(candidate),
            None => partitions.push((*kind, vec![candidate])),
        }
    }

    let mut plan = ClearPlan::default();
    for (kind, members) in partitions {
        if members.len() < min_cluster as usize {
            continue;
        }
        let components = connected_components(&members, |a, b| {
            world.in_contact(a.body, &[b.body]) || blocks_within(a.blocks, b.blocks, proximity)
        });
        for component in components {
            if component.len() < min_cluster as usize {
                continue;
            }
            let points = clear_points(cfg, component.len(), min_cluster);
            log::debug!("{} cluster of {} marked for {points}", kind.as_str(), component.len());
            plan.groups.push(ClearGroup {
                kind,
                pieces: component.iter().map(|c| c.piece).collect(),
                bodies: component.iter().map(|c| c.body).collect(),
                points,
            });
        }
    }
    plan
}
