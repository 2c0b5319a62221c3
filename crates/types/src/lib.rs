//! Shared types - plain data used by the core, the physics backends and the view layer
//!
//! Everything here is pure data with no game behaviour beyond parsing helpers.
//!
//! # Coordinates
//!
//! World units are pixels of the play field. `x` grows to the right and `y`
//! grows downward, so the top of the field is `y = 0` and the floor sits at
//! `y = field_height`. A "higher" pile therefore has a *smaller* minimum `y`.
//!
//! # Timing
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | One logical update per rendered frame (~60 FPS) |
//!
//! # Examples
//!
//! ```
//! use rigid_tetris_types::{Intent, PieceKind, Vec2};
//!
//! assert_eq!(PieceKind::from_str("t"), Some(PieceKind::T));
//! assert_eq!(Intent::from_str("hardDrop"), Some(Intent::HardDrop));
//!
//! let v = Vec2::new(3.0, 4.0);
//! assert_eq!(v.length(), 5.0);
//! ```

use serde::{Deserialize, Serialize};

/// Frame interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Upper bound on blocks per archetype. Fixed-capacity block lists use this.
pub const MAX_BLOCKS: usize = 4;

/// Number of piece archetypes in the catalog
pub const PIECE_KIND_COUNT: usize = 7;

/// 2D vector in world units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }

    /// Rotate counter-clockwise (in screen space: clockwise, since `y` points down).
    pub fn rotated(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The seven piece archetypes
///
/// The discriminant order is the catalog order and is used as a stable index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; PIECE_KIND_COUNT] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// ```
    /// use rigid_tetris_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("L"), Some(PieceKind::L));
    /// assert_eq!(PieceKind::from_str("x"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::J => "j",
            PieceKind::L => "l",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Abstract player intents
///
/// Produced by the input layer from keys, drags and taps. Movement intents are
/// *held*: they stay in effect every tick until released. `PauseToggle` and
/// `Restart` act once per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    RotateLeft,
    RotateRight,
    SoftDrop,
    /// Latched for the rest of the active piece's life once pressed
    HardDrop,
    PauseToggle,
    Restart,
}

impl Intent {
    /// Parse intent from a camelCase name (case-insensitive)
    ///
    /// ```
    /// use rigid_tetris_types::Intent;
    ///
    /// assert_eq!(Intent::from_str("moveLeft"), Some(Intent::MoveLeft));
    /// assert_eq!(Intent::from_str("rotateright"), Some(Intent::RotateRight));
    /// assert_eq!(Intent::from_str("hold"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(Intent::MoveLeft),
            "moveright" => Some(Intent::MoveRight),
            "rotateleft" => Some(Intent::RotateLeft),
            "rotateright" => Some(Intent::RotateRight),
            "softdrop" => Some(Intent::SoftDrop),
            "harddrop" => Some(Intent::HardDrop),
            "pausetoggle" | "pause" => Some(Intent::PauseToggle),
            "restart" => Some(Intent::Restart),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::MoveLeft => "moveLeft",
            Intent::MoveRight => "moveRight",
            Intent::RotateLeft => "rotateLeft",
            Intent::RotateRight => "rotateRight",
            Intent::SoftDrop => "softDrop",
            Intent::HardDrop => "hardDrop",
            Intent::PauseToggle => "pauseToggle",
            Intent::Restart => "restart",
        }
    }

    /// Whether the intent acts once per press rather than while held
    pub fn is_discrete(&self) -> bool {
        matches!(self, Intent::PauseToggle | Intent::Restart)
    }
}

/// Session phase
///
/// `NotStarted → Playing ⇄ Paused`, `Playing → LevelUpPending → Playing`,
/// and `Playing/Paused → GameOver` (terminal until a full restart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Playing,
    Paused,
    /// Blocking level-up notification; behaves as paused until dismissed
    LevelUpPending,
    GameOver,
}

impl Phase {
    pub fn is_paused(&self) -> bool {
        matches!(self, Phase::Paused | Phase::LevelUpPending)
    }
}

/// Core-side notifications for the presentation layer
///
/// The core never reads these back. Celebratory text, shake and sounds are
/// triggered from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PieceSpawned { piece: u32, kind: PieceKind },
    PieceSettled { piece: u32, kind: PieceKind },
    ClusterCleared { kind: PieceKind, pieces: u32, points: u32 },
    PerfectClear { bonus: u32 },
    Shake { duration_ms: u32 },
    LevelUp { level: u32, min_cluster: u32 },
    NewHighScore { score: u32 },
    GameOver { final_score: u32 },
}
