use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Category, LibraryEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStats {
    pub counts_by_category: BTreeMap<Category, usize>,
    pub total: usize,
    pub total_size: u64,
    /// `total / capacity`, capped at 1.0.
    pub progress: f64,
}

impl LibraryStats {
    pub fn count(&self, category: Category) -> usize {
        self.counts_by_category.get(&category).copied().unwrap_or(0)
    }
}

pub fn aggregate(entries: &[LibraryEntry], capacity: usize) -> LibraryStats {
    let counts_by_category = entries.iter().fold(BTreeMap::new(), |mut acc, entry| {
        *acc.entry(entry.category()).or_insert(0) += 1;
        acc
    });
    let total = entries.len();

    LibraryStats {
        counts_by_category,
        total,
        total_size: entries.iter().map(|e| e.size()).sum(),
        progress: progress(total, capacity),
    }
}

fn progress(total: usize, capacity: usize) -> f64 {
    match capacity {
        0 => 1.0,
        cap => (total as f64 / cap as f64).min(1.0),
    }
}
