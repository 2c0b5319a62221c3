//! Progression & score tracker
//!
//! Score only ever grows. Every award goes through [`award`], which handles
//! level thresholds, the minimum cluster size, the blocking level-up state,
//! and the one-time "new high score" notification.
//!
//! Cluster scoring:
//!
//! ```text
//! points = base_points * size * (100 + bonus_percent * (size - min_cluster)) / 100
//! ```
//!
//! so a cluster of exactly `min_cluster` pieces pays the base rate with no bonus.

use crate::config::{ClearConfig, ProgressionConfig};
use crate::session::GameSession;
use crate::types::{GameEvent, Phase};

/// Minimum cluster size that clears at `level` (1-based). Strictly increasing.
pub fn min_cluster_for_level(cfg: &ProgressionConfig, level: u32) -> u32 {
    cfg.base_min_cluster.max(3) + level.saturating_sub(1)
}

/// Score at which `level` ends and the next begins.
pub fn level_end_score(cfg: &ProgressionConfig, level: u32) -> u64 {
    let n = level as u64;
    cfg.level_score_step as u64 * n * (n + 1) / 2
}

/// Points for clearing one cluster of `size` pieces.
pub fn clear_points(cfg: &ClearConfig, size: usize, min_cluster: u32) -> u32 {
    let size = size as u64;
    let extra = size.saturating_sub(min_cluster as u64);
    let percent = 100 + cfg.bonus_percent_per_extra as u64 * extra;
    let points = cfg.base_points as u64 * size * percent / 100;
    points.min(u32::MAX as u64) as u32
}

/// Add points and run every rule that hangs off a score change.
///
/// Returns true if the level advanced.
pub fn award(
    session: &mut GameSession,
    cfg: &ProgressionConfig,
    points: u32,
    events: &mut Vec<GameEvent>,
) -> bool {
    if points == 0 {
        return false;
    }
    session.score = session.score.saturating_add(points);

    let mut leveled = false;
    while session.score as u64 >= level_end_score(cfg, session.level) {
        session.level += 1;
        session.min_cluster = min_cluster_for_level(cfg, session.level);
        leveled = true;
    }
    if leveled {
        log::info!(
            "Level up: {} (clusters need {})",
            session.level,
            session.min_cluster
        );
        events.push(GameEvent::LevelUp {
            level: session.level,
            min_cluster: session.min_cluster,
        });
        if session.phase == Phase::Playing {
            session.phase = Phase::LevelUpPending;
        }
    }

    if session.score > session.high_score {
        session.high_score = session.score;
    }
    if !session.new_high_announced
        && session.high_score_at_start > 0
        && session.score > session.high_score_at_start
    {
        session.new_high_announced = true;
        log::info!("New high score: {}", session.score);
        events.push(GameEvent::NewHighScore {
            score: session.score,
        });
    }

    leveled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(high: u32) -> GameSession {
        let mut s = GameSession::new(high, 3);
        s.start();
        s
    }

    #[test]
    fn level_one_min_cluster_is_three() {
        assert_eq!(min_cluster_for_level(&ProgressionConfig::default(), 1), 3);
    }

    #[test]
    fn min_cluster_strictly_increases() {
        let cfg = ProgressionConfig::default();
        for level in 1..20 {
            assert!(min_cluster_for_level(&cfg, level + 1) > min_cluster_for_level(&cfg, level));
        }
    }

    #[test]
    fn exact_minimum_cluster_has_no_bonus() {
        let cfg = ClearConfig::default();
        assert_eq!(clear_points(&cfg, 3, 3), 300);
    }

    #[test]
    fn one_extra_piece_pays_strictly_more() {
        let cfg = ClearConfig::default();
        assert!(clear_points(&cfg, 4, 3) > clear_points(&cfg, 3, 3));
        assert_eq!(clear_points(&cfg, 4, 3), 600);
    }

    #[test]
    fn crossing_threshold_levels_up_and_blocks() {
        let cfg = ProgressionConfig::default();
        let mut s = playing(0);
        let mut events = Vec::new();

        assert!(!award(&mut s, &cfg, 1999, &mut events));
        assert!(award(&mut s, &cfg, 1, &mut events));
        assert_eq!(s.level(), 2);
        assert_eq!(s.min_cluster(), 4);
        assert_eq!(s.phase(), Phase::LevelUpPending);
        assert!(events.contains(&GameEvent::LevelUp {
            level: 2,
            min_cluster: 4
        }));
    }

    #[test]
    fn large_award_can_skip_levels() {
        let cfg = ProgressionConfig::default();
        let mut s = playing(0);
        let mut events = Vec::new();
        award(&mut s, &cfg, 6000, &mut events);
        assert_eq!(s.level(), 3);
        assert_eq!(s.min_cluster(), 5);
    }

    #[test]
    fn new_high_score_fires_once() {
        let cfg = ProgressionConfig::default();
        let mut s = playing(100);
        let mut events = Vec::new();

        award(&mut s, &cfg, 50, &mut events);
        award(&mut s, &cfg, 60, &mut events);
        award(&mut s, &cfg, 60, &mut events);

        let count = events
            .iter()
            .filter(|e| matches!(e, GameEvent::NewHighScore { .. }))
            .count();
        assert_eq!(count, 1);
        assert_eq!(s.high_score(), 170);
    }

    #[test]
    fn first_ever_session_never_announces_high_score() {
        let cfg = ProgressionConfig::default();
        let mut s = playing(0);
        let mut events = Vec::new();
        award(&mut s, &cfg, 500, &mut events);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::NewHighScore { .. })));
        assert_eq!(s.high_score(), 500);
    }
}
