//! The leaderboard engine: an ordered, capped, validated collection of
//! entries for one game level, with binary file persistence.
//!
//! The entry collection is always sorted by the active sort method right
//! after any mutation; insertion order carries no meaning. Invalid entries
//! are dropped silently, mirroring server-side anti-cheat filtering, and
//! nothing is reported back to the submitter.

use crate::entry::{LevelId, PlayerEntry, SortMethod};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Hard cap on stored entries; sorting truncates the lowest-ranked excess.
pub const MAX_ENTRIES: usize = 100;

/// Version tag written at the head of every leaderboard file. A mismatch on
/// read skips the whole file, there is no partial read or migration.
pub const FILE_VERSION: i32 = 1;

/// Sort method forced before persisting, independent of whatever sort the
/// in-memory view currently uses for display.
pub const CANONICAL_WRITE_ORDER: SortMethod = SortMethod::HighestScore;

#[derive(Debug, Clone)]
pub struct Leaderboard {
    level: LevelId,
    entries: Vec<PlayerEntry>,
    sort_method: SortMethod,
}

impl Leaderboard {
    pub fn new(level: LevelId) -> Self {
        Self {
            level,
            entries: Vec::new(),
            sort_method: CANONICAL_WRITE_ORDER,
        }
    }

    pub fn level(&self) -> LevelId {
        self.level
    }

    pub fn sort_method(&self) -> SortMethod {
        self.sort_method
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates and appends one entry, then re-sorts. Returns whether the
    /// entry was accepted; invalid entries are dropped without error.
    pub fn add_entry(&mut self, entry: PlayerEntry) -> bool {
        if !entry.is_valid() {
            debug!(
                "Dropped invalid entry '{}' for level {:?}",
                entry.player_name, self.level
            );
            return false;
        }

        self.entries.push(entry);
        self.sort();
        true
    }

    /// Validates and appends each entry independently, re-sorting once at
    /// the end. Returns whether at least one entry was accepted.
    pub fn add_entries(&mut self, entries: Vec<PlayerEntry>) -> bool {
        let mut accepted = false;
        for entry in entries {
            if entry.is_valid() {
                self.entries.push(entry);
                accepted = true;
            } else {
                debug!(
                    "Dropped invalid entry '{}' for level {:?}",
                    entry.player_name, self.level
                );
            }
        }

        if accepted {
            self.sort();
        }
        accepted
    }

    /// Returns up to `count` entries starting at `start_index` in the
    /// current sort order. A negative or past-the-end start index yields an
    /// empty list, and a short leaderboard yields fewer than `count`.
    pub fn get_entries(&self, count: i32, start_index: i32) -> Vec<PlayerEntry> {
        if count <= 0 || start_index < 0 {
            return Vec::new();
        }

        let start = start_index as usize;
        if start >= self.entries.len() {
            return Vec::new();
        }

        let end = (start + count as usize).min(self.entries.len());
        self.entries[start..end].to_vec()
    }

    /// Switches the active sort method and re-sorts.
    pub fn set_sort_method(&mut self, sort_method: SortMethod) {
        self.sort_method = sort_method;
        self.sort();
    }

    /// Re-applies the active sort method to the full collection, then
    /// truncates to [`MAX_ENTRIES`], dropping the lowest-ranked excess.
    pub fn sort(&mut self) {
        let method = self.sort_method;
        self.entries.sort_by(|a, b| method.compare(a, b));
        if self.entries.len() > MAX_ENTRIES {
            self.entries.truncate(MAX_ENTRIES);
        }
        debug!(
            "Leaderboard {:?} sorted by {:?} ({} entries)",
            self.level,
            method,
            self.entries.len()
        );
    }

    /// Drops all entries in memory. Any persisted file is untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Persists the leaderboard, forcing the canonical write order first.
    /// Layout: the version tag, then one record per entry until EOF, capped
    /// at [`MAX_ENTRIES`] records. Overwrites any existing file.
    pub fn write_to_file(&mut self, path: &Path) -> Result<(), crate::BoxError> {
        self.set_sort_method(CANONICAL_WRITE_ORDER);

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &FILE_VERSION)?;
        for entry in self.entries.iter().take(MAX_ENTRIES) {
            bincode::serialize_into(&mut writer, entry)?;
        }
        writer.flush()?;

        debug!(
            "Wrote {} entries for level {:?} to {}",
            self.entries.len(),
            self.level,
            path.display()
        );
        Ok(())
    }

    /// Loads entries from a persisted file. A version mismatch skips the
    /// file entirely and leaves the leaderboard as it was; otherwise the
    /// current entries are replaced by the file's records (up to the cap)
    /// and re-sorted. The file is decoded into a scratch buffer first, so a
    /// corrupt record mid-file returns an error with the in-memory entries
    /// untouched.
    pub fn read_from_file(&mut self, path: &Path) -> Result<(), crate::BoxError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let version: i32 = bincode::deserialize_from(&mut reader)?;
        if version != FILE_VERSION {
            warn!(
                "Leaderboard file {} has version {} (expected {}), skipping",
                path.display(),
                version,
                FILE_VERSION
            );
            return Ok(());
        }

        let mut loaded = Vec::new();
        while loaded.len() < MAX_ENTRIES {
            match bincode::deserialize_from::<_, PlayerEntry>(&mut reader) {
                Ok(entry) => loaded.push(entry),
                Err(err) => match *err {
                    bincode::ErrorKind::Io(ref io) if io.kind() == ErrorKind::UnexpectedEof => {
                        break
                    }
                    _ => return Err(err.into()),
                },
            }
        }

        self.entries = loaded;
        self.sort();
        debug!(
            "Read {} entries for level {:?} from {}",
            self.entries.len(),
            self.level,
            path.display()
        );
        Ok(())
    }

    /// File name derived deterministically from the level.
    pub fn file_name(level: LevelId) -> String {
        format!("leaderboard_{}.bin", level.name())
    }

    pub fn default_path(dir: &Path, level: LevelId) -> PathBuf {
        dir.join(Self::file_name(level))
    }
}
