//! High score persistence
//!
//! The store holds a single non-negative integer. Reads never fail: a missing
//! or unreadable record is treated as zero.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Durable home of the single high score value
pub trait HighScoreStore {
    fn load(&self) -> u32;
    fn save(&mut self, score: u32) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryHighScore(pub u32);

impl HighScoreStore for MemoryHighScore {
    fn load(&self) -> u32 {
        self.0
    }

    fn save(&mut self, score: u32) -> Result<()> {
        self.0 = score;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// JSON file store: `{"high_score": 1234}`
#[derive(Debug, Clone)]
pub struct JsonFileHighScore {
    path: PathBuf,
}

impl JsonFileHighScore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileHighScore {
    fn load(&self) -> u32 {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return 0;
        };
        match serde_json::from_str::<HighScoreRecord>(&raw) {
            Ok(record) => record.high_score,
            Err(e) => {
                log::warn!("Ignoring corrupt high score file {}: {e}", self.path.display());
                0
            }
        }
    }

    fn save(&mut self, score: u32) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_string(&HighScoreRecord { high_score: score })?;
        fs::write(&self.path, body)
            .with_context(|| format!("writing high score to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "rigid-tetris-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryHighScore::default();
        assert_eq!(store.load(), 0);
        store.save(42).unwrap();
        assert_eq!(store.load(), 42);
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let store = JsonFileHighScore::new(temp_path("missing"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn corrupt_file_reads_as_zero() {
        let path = temp_path("corrupt");
        fs::write(&path, "not json").unwrap();
        let store = JsonFileHighScore::new(&path);
        assert_eq!(store.load(), 0);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn file_store_persists() {
        let path = temp_path("persist");
        let mut store = JsonFileHighScore::new(&path);
        store.save(1500).unwrap();
        assert_eq!(JsonFileHighScore::new(&path).load(), 1500);
        let _ = fs::remove_file(&path);
    }
}
