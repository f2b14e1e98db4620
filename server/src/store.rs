//! The server's canonical leaderboards, one per level.
//!
//! Boards are constructed eagerly at startup and loaded from disk when a
//! persisted file exists. Mutation and persistence happen together under the
//! caller's lock, so the file on disk never lags the accepted entries.

use log::{info, warn};
use shared::leaderboard::Leaderboard;
use shared::{BoxError, LevelId, PlayerEntry};
use std::path::{Path, PathBuf};

pub struct LeaderboardStore {
    boards: [Leaderboard; LevelId::COUNT],
    data_dir: PathBuf,
}

impl LeaderboardStore {
    /// Builds one board per level, loading any persisted files found under
    /// `data_dir`. A missing file just means an empty board; an unreadable
    /// one is logged and skipped.
    pub fn load(data_dir: &Path) -> Self {
        let boards = LevelId::ALL.map(|level| {
            let mut board = Leaderboard::new(level);
            let path = Leaderboard::default_path(data_dir, level);
            if path.exists() {
                match board.read_from_file(&path) {
                    Ok(()) => info!(
                        "Loaded {} entries for level {:?} from {}",
                        board.len(),
                        level,
                        path.display()
                    ),
                    Err(e) => warn!("Failed to load {}: {}", path.display(), e),
                }
            }
            board
        });

        Self {
            boards,
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn board(&self, level: LevelId) -> &Leaderboard {
        &self.boards[level as usize]
    }

    /// Adds one entry to the level's canonical board and, when accepted,
    /// persists the board to disk before returning. Invalid entries are
    /// dropped and nothing is written.
    pub fn add_entry(&mut self, level: LevelId, entry: PlayerEntry) -> Result<bool, BoxError> {
        let board = &mut self.boards[level as usize];
        if !board.add_entry(entry) {
            return Ok(false);
        }

        let path = Leaderboard::default_path(&self.data_dir, level);
        board.write_to_file(&path)?;
        Ok(true)
    }
}
