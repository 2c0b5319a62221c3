//! Game session - process-wide mutable state and the pause / game-over controller
//!
//! Phase transitions:
//!
//! ```text
//! NotStarted ──start──▶ Playing ◀──toggle──▶ Paused
//!                         │  ▲                  │
//!               level-up  ▼  │ dismiss          │
//!                   LevelUpPending              │
//!                         │                     │
//!                         └────▶ GameOver ◀─────┘   (terminal)
//! ```

use crate::types::Phase;

#[derive(Debug, Clone)]
pub struct GameSession {
    pub(crate) score: u32,
    pub(crate) high_score: u32,
    /// Persisted high score as it was when the session began
    pub(crate) high_score_at_start: u32,
    pub(crate) level: u32,
    pub(crate) min_cluster: u32,
    pub(crate) phase: Phase,
    pub(crate) now_ms: u64,
    pub(crate) last_action_ms: u64,
    pub(crate) was_pile_moving: bool,
    pub(crate) new_high_announced: bool,
    pub(crate) final_score: Option<u32>,
    pub(crate) shaking: bool,
    /// Bumped on every restart; deferred tasks from older epochs are void
    pub(crate) epoch: u32,
}

impl GameSession {
    pub fn new(persisted_high_score: u32, min_cluster: u32) -> Self {
        Self {
            score: 0,
            high_score: persisted_high_score,
            high_score_at_start: persisted_high_score,
            level: 1,
            min_cluster,
            phase: Phase::NotStarted,
            now_ms: 0,
            last_action_ms: 0,
            was_pile_moving: false,
            new_high_announced: false,
            final_score: None,
            shaking: false,
            epoch: 0,
        }
    }

    /// Fresh session for a restart: keeps the epoch counter moving forward.
    pub fn restarted(&self, persisted_high_score: u32, min_cluster: u32) -> Self {
        let mut next = Self::new(persisted_high_score, min_cluster);
        next.epoch = self.epoch.wrapping_add(1);
        next
    }

    pub fn start(&mut self) -> bool {
        if self.phase != Phase::NotStarted {
            return false;
        }
        self.phase = Phase::Playing;
        self.last_action_ms = self.now_ms;
        true
    }

    /// Playing ⇄ Paused; also dismisses a pending level-up.
    /// Disallowed before the game has started and after game over.
    pub fn toggle_pause(&mut self) -> bool {
        self.phase = match self.phase {
            Phase::Playing => Phase::Paused,
            Phase::Paused | Phase::LevelUpPending => Phase::Playing,
            Phase::NotStarted | Phase::GameOver => return false,
        };
        true
    }

    pub fn dismiss_level_up(&mut self) -> bool {
        if self.phase != Phase::LevelUpPending {
            return false;
        }
        self.phase = Phase::Playing;
        true
    }

    /// Enter the terminal state. Returns false if already there.
    pub fn enter_game_over(&mut self) -> bool {
        if self.phase == Phase::GameOver {
            return false;
        }
        self.phase = Phase::GameOver;
        self.final_score = Some(self.score);
        true
    }

    pub fn touch(&mut self) {
        self.last_action_ms = self.now_ms;
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn min_cluster(&self) -> u32 {
        self.min_cluster
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn last_action_ms(&self) -> u64 {
        self.last_action_ms
    }

    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}
