#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Leaderboard storage adapters implementing [`ScoreboardPort`].
//!
//! Both adapters keep the board ranked by descending score and capped at
//! [`train_mania_core::LEADERBOARD_CAPACITY`] entries on every append.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use train_mania_core::{rank_entries, LeaderboardEntry, ScoreboardError, ScoreboardPort};

/// File name used when no explicit leaderboard path is configured.
pub const DEFAULT_FILE_NAME: &str = "train-mania-board.json";

/// Leaderboard kept in process memory for the lifetime of the session.
#[derive(Clone, Debug, Default)]
pub struct MemoryScoreboard {
    entries: Vec<LeaderboardEntry>,
}

impl MemoryScoreboard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreboardPort for MemoryScoreboard {
    fn append(&mut self, entry: LeaderboardEntry) -> Result<(), ScoreboardError> {
        self.entries.push(entry);
        rank_entries(&mut self.entries);
        Ok(())
    }

    fn list(&self) -> Result<Vec<LeaderboardEntry>, ScoreboardError> {
        Ok(self.entries.clone())
    }
}

/// Leaderboard persisted as a JSON array in a single file.
///
/// The file is re-read on every operation so separate processes sharing the
/// path see each other's scores. A missing file is an empty board.
#[derive(Clone, Debug)]
pub struct JsonFileScoreboard {
    path: PathBuf,
}

impl JsonFileScoreboard {
    /// Creates an adapter backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<LeaderboardEntry>, ScoreboardError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "leaderboard file absent, starting empty");
                return Ok(Vec::new());
            }
            Err(error) => return Err(error.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|error| ScoreboardError::Malformed(error.to_string()))
    }

    fn write(&self, entries: &[LeaderboardEntry]) -> Result<(), ScoreboardError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialised = serde_json::to_string_pretty(entries)
            .map_err(|error| ScoreboardError::Malformed(error.to_string()))?;
        fs::write(&self.path, serialised)?;
        Ok(())
    }
}

impl ScoreboardPort for JsonFileScoreboard {
    fn append(&mut self, entry: LeaderboardEntry) -> Result<(), ScoreboardError> {
        let mut entries = match self.read() {
            Ok(entries) => entries,
            Err(ScoreboardError::Malformed(reason)) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "leaderboard file is malformed, starting a fresh board"
                );
                Vec::new()
            }
            Err(error) => return Err(error),
        };
        entries.push(entry);
        rank_entries(&mut entries);
        self.write(&entries)?;
        debug!(path = %self.path.display(), entries = entries.len(), "leaderboard saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<LeaderboardEntry>, ScoreboardError> {
        let mut entries = self.read()?;
        rank_entries(&mut entries);
        Ok(entries)
    }
}
