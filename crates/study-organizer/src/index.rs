use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::LibraryEntry;

/// In-memory index of managed files, keyed by absolute path.
///
/// Insertion order is kept so callers can fall back to it for display.
/// `positions` maps each path to its slot in `entries`.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    entries: Vec<LibraryEntry>,
    positions: HashMap<PathBuf, usize>,
}

impl LibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` unless its path is already indexed; returns the indexed entry.
    pub fn insert(&mut self, entry: LibraryEntry) -> &LibraryEntry {
        let pos = match self.positions.get(entry.path()) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.positions.insert(entry.path().to_path_buf(), pos);
                self.entries.push(entry);
                pos
            }
        };
        &self.entries[pos]
    }

    pub fn remove(&mut self, path: &Path) -> Option<LibraryEntry> {
        let pos = self.positions.remove(path)?;
        let removed = self.entries.remove(pos);
        for slot in self.positions.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, path: &Path) -> Option<&LibraryEntry> {
        self.positions.get(path).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.positions.contains_key(path)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn snapshot(&self) -> Vec<LibraryEntry> {
        self.entries.clone()
    }
}
