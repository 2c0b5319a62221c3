//! Engine configuration - every tunable threshold in one place
//!
//! Units: distances in world units (field pixels), speeds in world units per
//! second, angles in radians, times in milliseconds.
//!
//! All sections deserialize with defaults for missing fields, so a config
//! file only needs to name what it changes:
//!
//! ```
//! use rigid_tetris_core::EngineConfig;
//!
//! let cfg = EngineConfig::from_json_str(r#"{ "timing": { "spawn_delay_ms": 250 } }"#).unwrap();
//! assert_eq!(cfg.timing.spawn_delay_ms, 250);
//! assert_eq!(cfg.field.block_size, 30.0);
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::Vec2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub field: FieldConfig,
    pub control: ControlConfig,
    pub settle: SettleConfig,
    pub pile: PileConfig,
    pub clear: ClearConfig,
    pub progression: ProgressionConfig,
    pub timing: TimingConfig,
    pub material: Material,
}

/// Play-field geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub width: f32,
    pub height: f32,
    pub block_size: f32,
    /// Spawn point (top-centre of the field by default)
    pub spawn_x: f32,
    pub spawn_y: f32,
    /// Downward acceleration handed to the physics world
    pub gravity: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 720.0,
            block_size: 30.0,
            spawn_x: 180.0,
            spawn_y: 45.0,
            gravity: 900.0,
        }
    }
}

impl FieldConfig {
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.spawn_x, self.spawn_y)
    }
}

/// Player control response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Horizontal speed while a move intent is held
    pub move_speed: f32,
    /// Angle added per tick while a rotate intent is held
    pub rotation_step: f32,
    pub soft_drop_speed: f32,
    pub hard_drop_speed: f32,
    /// Vertical speed of a hard-dropped piece once it touches the pile
    pub hard_drop_contact_speed: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            move_speed: 150.0,
            rotation_step: 0.05,
            soft_drop_speed: 240.0,
            hard_drop_speed: 900.0,
            hard_drop_contact_speed: 5.0,
        }
    }
}

/// Settle-detection heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// Below this speed a piece touching the pile counts as settled
    pub settle_speed: f32,
    /// Displacement that counts as "still moving" for stagnation tracking
    pub motion_threshold: f32,
    pub stagnation_ms: u64,
    /// How far below the spawn point a stagnant piece must be before it may settle
    pub spawn_clearance: f32,
    /// Distance above the floor of the near-floor line
    pub floor_margin: f32,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            settle_speed: 12.0,
            motion_threshold: 2.0,
            stagnation_ms: 1200,
            spawn_clearance: 90.0,
            floor_margin: 20.0,
        }
    }
}

/// Pile monitoring and spawn blocking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PileConfig {
    /// Settled pieces faster than this count as moving
    pub still_speed: f32,
    /// Settled pieces above this line may block spawning
    pub spawn_exclusion_y: f32,
    /// Half-width of the blocking window around the spawn column
    pub spawn_window_half_width: f32,
    /// Blocking pieces must be slower than this
    pub spawn_block_speed: f32,
    pub danger_percent: f32,
    /// Force a spawn after this long without an action and no active piece
    pub idle_spawn_ms: u64,
}

impl Default for PileConfig {
    fn default() -> Self {
        Self {
            still_speed: 6.0,
            spawn_exclusion_y: 90.0,
            spawn_window_half_width: 75.0,
            spawn_block_speed: 6.0,
            danger_percent: 80.0,
            idle_spawn_ms: 3000,
        }
    }
}

/// Cluster clearing and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearConfig {
    /// Proximity fallback distance as a multiple of one block's diagonal
    pub proximity_factor: f32,
    pub base_points: u32,
    /// Multiplier growth per piece beyond the minimum cluster size, in percent
    pub bonus_percent_per_extra: u32,
    pub perfect_clear_bonus: u32,
    pub placement_points: u32,
}

impl Default for ClearConfig {
    fn default() -> Self {
        Self {
            proximity_factor: 1.05,
            base_points: 100,
            bonus_percent_per_extra: 50,
            perfect_clear_bonus: 5000,
            placement_points: 10,
        }
    }
}

/// Level thresholds and cluster-size growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Level `n` ends at `level_score_step * n * (n + 1) / 2` points
    pub level_score_step: u32,
    /// Minimum cluster size at level 1 (never below 3)
    pub base_min_cluster: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_score_step: 2000,
            base_min_cluster: 3,
        }
    }
}

/// Deferred side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between a piece settling and the next spawn
    pub spawn_delay_ms: u64,
    pub shake_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            spawn_delay_ms: 400,
            shake_ms: 300,
        }
    }
}

/// Surface and sleep properties of piece bodies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
    /// Linear speed under which a body may fall asleep
    pub sleep_threshold: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.6,
            restitution: 0.0,
            density: 1.0,
            sleep_threshold: 4.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(json).context("parse engine config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let f = &self.field;
        if f.width <= 0.0 || f.height <= 0.0 || f.block_size <= 0.0 {
            bail!("field dimensions and block size must be positive");
        }
        if !(0.0..=f.width).contains(&f.spawn_x) || !(0.0..=f.height).contains(&f.spawn_y) {
            bail!("spawn point ({}, {}) lies outside the field", f.spawn_x, f.spawn_y);
        }
        if self.pile.spawn_exclusion_y >= f.height {
            bail!("spawn exclusion line must sit above the floor");
        }
        if self.progression.base_min_cluster < 3 {
            bail!("base_min_cluster must be at least 3");
        }
        if self.progression.level_score_step == 0 {
            bail!("level_score_step must be positive");
        }
        if self.clear.proximity_factor <= 0.0 {
            bail!("proximity_factor must be positive");
        }
        Ok(())
    }

    /// Centre-to-centre distance under which two blocks count as adjacent
    pub fn proximity_threshold(&self) -> f32 {
        self.field.block_size * std::f32::consts::SQRT_2 * self.clear.proximity_factor
    }

    /// Pile height that maps to 100% fill
    pub fn max_usable_height(&self) -> f32 {
        self.field.height - self.pile.spawn_exclusion_y
    }

    /// `y` past which a descending piece always settles
    pub fn floor_line(&self) -> f32 {
        self.field.height - self.settle.floor_margin
    }
}
