//! High-Score Persistence
//!
//! The only piece of state that outlives a match. Kept behind a narrow trait
//! so the session can run against a file, memory, or anything else.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// High-score storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("high-score store I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored data is not valid JSON.
    #[error("high-score store is corrupt: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persistent best-score storage.
pub trait HighScoreStore {
    /// Read the stored high score (0 if none).
    fn load(&self) -> Result<u32, StoreError>;

    /// Overwrite the stored high score.
    fn save(&mut self, score: u32) -> Result<(), StoreError>;
}

/// On-disk record.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// High score kept as `{"high_score": n}` in a JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileHighScoreStore {
    path: PathBuf,
}

impl JsonFileHighScoreStore {
    /// Store backed by the given file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileHighScoreStore {
    fn load(&self) -> Result<u32, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let record: HighScoreRecord = serde_json::from_str(&contents)?;
                Ok(record.high_score)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        let json = serde_json::to_string(&HighScoreRecord { high_score: score })?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store, for tests and embedding.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryHighScoreStore {
    high_score: u32,
}

impl MemoryHighScoreStore {
    /// Store seeded with a value.
    pub fn new(high_score: u32) -> Self {
        Self { high_score }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&self) -> Result<u32, StoreError> {
        Ok(self.high_score)
    }

    fn save(&mut self, score: u32) -> Result<(), StoreError> {
        self.high_score = score;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHighScoreStore::new(dir.path().join("scores.json"));
        assert_eq!(store.load().unwrap(), 0);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");

        let mut store = JsonFileHighScoreStore::new(&path);
        store.save(342).unwrap();

        let reopened = JsonFileHighScoreStore::new(&path);
        assert_eq!(reopened.load().unwrap(), 342);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"high_score":342}"#);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileHighScoreStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryHighScoreStore::new(10);
        assert_eq!(store.load().unwrap(), 10);
        store.save(25).unwrap();
        assert_eq!(store.load().unwrap(), 25);
    }
}
