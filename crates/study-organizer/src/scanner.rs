use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::types::LibraryEntry;

pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut file = std::fs::File::open(path)?;
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Groups entries whose files have identical content.
///
/// Ingestion only de-duplicates by name, so this is a report, not a policy.
/// Files that cannot be read are left out.
pub fn find_duplicates(entries: &[LibraryEntry]) -> Vec<Vec<LibraryEntry>> {
    let hashed: Vec<(String, &LibraryEntry)> = entries
        .par_iter()
        .filter_map(|entry| match hash_file(entry.path()) {
            Ok(hash) => Some((hash, entry)),
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable file");
                None
            }
        })
        .collect();

    let mut groups: Vec<Vec<LibraryEntry>> = hashed
        .into_iter()
        .fold(
            HashMap::<String, Vec<LibraryEntry>>::new(),
            |mut acc, (hash, entry)| {
                acc.entry(hash).or_default().push(entry.clone());
                acc
            },
        )
        .into_values()
        .filter(|group| group.len() > 1)
        .collect();

    groups.iter_mut().for_each(|g| g.sort_by(|a, b| a.path().cmp(b.path())));
    groups.sort_by(|a, b| a[0].path().cmp(b[0].path()));
    groups
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[(u64, &str)] = &[
        (1024 * 1024 * 1024, "GB"),
        (1024 * 1024, "MB"),
        (1024, "KB"),
    ];

    UNITS
        .iter()
        .find(|(threshold, _)| bytes >= *threshold)
        .map(|(threshold, unit)| format!("{:.1} {}", bytes as f64 / *threshold as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}
