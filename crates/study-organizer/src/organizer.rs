use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::LibraryError;
use crate::types::{Category, LibraryEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Move {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug)]
pub struct OrganizeFailure {
    pub path: PathBuf,
    pub error: LibraryError,
}

#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub moved: Vec<Move>,
    pub failures: Vec<OrganizeFailure>,
}

impl OrganizeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn collisions(&self) -> impl Iterator<Item = &OrganizeFailure> {
        self.failures
            .iter()
            .filter(|f| matches!(f.error, LibraryError::Collision { .. }))
    }
}

/// A move the organizer intends to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub category: Category,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Pure planning: which entries are not yet in `root/<Category>/`.
pub fn plan_moves(root: &Path, entries: &[LibraryEntry]) -> Vec<PlannedMove> {
    entries
        .iter()
        .filter_map(|entry| {
            let category = entry.category();
            let folder = root.join(category.label());
            if entry.path().parent() == Some(folder.as_path()) {
                return None;
            }
            let to = folder.join(entry.path().file_name()?);
            (to != entry.path()).then(|| PlannedMove {
                category,
                from: entry.path().to_path_buf(),
                to,
            })
        })
        .collect()
}

/// Moves each entry into the folder named after its category.
///
/// Every entry is attempted; failures are collected. An existing file at a
/// destination is a collision and stays where it is, as does the source.
pub fn organize(root: &Path, entries: &[LibraryEntry]) -> OrganizeReport {
    let categories: BTreeSet<Category> = entries.iter().map(|e| e.category()).collect();

    let unavailable: BTreeMap<Category, (PathBuf, io::ErrorKind, String)> = categories
        .into_iter()
        .filter_map(|category| {
            let folder = root.join(category.label());
            fs::create_dir_all(&folder).err().map(|e| {
                warn!(path = %folder.display(), error = %e, "cannot create category folder");
                (category, (folder, e.kind(), e.to_string()))
            })
        })
        .collect();

    let mut report = OrganizeReport::default();

    for planned in plan_moves(root, entries) {
        let outcome = match unavailable.get(&planned.category) {
            Some((folder, kind, message)) => Err(LibraryError::io(
                folder,
                io::Error::new(*kind, message.clone()),
            )),
            None => move_entry(&planned.from, &planned.to),
        };

        match outcome {
            Ok(()) => {
                debug!(from = %planned.from.display(), to = %planned.to.display(), "moved");
                report.moved.push(Move {
                    from: planned.from,
                    to: planned.to,
                });
            }
            Err(error) => {
                warn!(path = %planned.from.display(), %error, "not moved");
                report.failures.push(OrganizeFailure {
                    path: planned.from,
                    error,
                });
            }
        }
    }

    info!(
        moved = report.moved.len(),
        failed = report.failures.len(),
        "organized library"
    );
    report
}

fn move_entry(from: &Path, to: &Path) -> Result<(), LibraryError> {
    if to.symlink_metadata().is_ok() {
        return Err(LibraryError::Collision {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }

    fs::rename(from, to).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound if from.symlink_metadata().is_err() => {
            LibraryError::NotFound(from.to_path_buf())
        }
        _ => LibraryError::io(from, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;
    use tempfile::TempDir;

    fn write_entry(path: &Path, content: &[u8]) -> LibraryEntry {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        LibraryEntry::from_file(path).unwrap()
    }

    #[test]
    fn plan_skips_organized_entries() {
        let root = Path::new("/lib");
        let entries = vec![
            LibraryEntry::new(root.join("PDF/a.pdf"), 1, Utc::now()),
            LibraryEntry::new(root.join("b.jpg"), 1, Utc::now()),
            LibraryEntry::new(root.join("misc/c.mp4"), 1, Utc::now()),
        ];

        let plan = plan_moves(root, &entries);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].to, PathBuf::from("/lib/Images/b.jpg"));
        assert_eq!(plan[1].to, PathBuf::from("/lib/Videos/c.mp4"));
    }

    #[test]
    fn organize_moves_into_category_folders() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entries = vec![
            write_entry(&root.join("a.pdf"), b"a"),
            write_entry(&root.join("b.jpg"), b"b"),
            write_entry(&root.join("notes.txt"), b"n"),
        ];

        let report = organize(root, &entries);

        assert!(report.is_clean());
        assert_eq!(report.moved.len(), 3);
        assert!(root.join("PDF/a.pdf").exists());
        assert!(root.join("Images/b.jpg").exists());
        assert!(root.join("Documents/notes.txt").exists());
        assert!(!root.join("a.pdf").exists());
    }

    #[test]
    fn organize_creates_folder_for_already_organized_category() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entries = vec![write_entry(&root.join("Videos/clip.mov"), b"v")];

        let report = organize(root, &entries);

        assert!(report.moved.is_empty());
        assert!(report.is_clean());
        assert!(root.join("Videos/clip.mov").exists());
    }

    #[test]
    fn collision_is_reported_and_nothing_overwritten() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entries = vec![
            write_entry(&root.join("x/report.pdf"), b"first"),
            write_entry(&root.join("y/report.pdf"), b"second"),
        ];

        let report = organize(root, &entries);

        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.collisions().count(), 1);
        assert_eq!(report.failures[0].error.kind(), ErrorKind::Collision);
        assert_eq!(fs::read(root.join("PDF/report.pdf")).unwrap(), b"first");
        assert_eq!(fs::read(root.join("y/report.pdf")).unwrap(), b"second");
    }

    #[test]
    fn existing_destination_is_a_collision() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_entry(&root.join("Images/pic.png"), b"kept");
        let entries = vec![write_entry(&root.join("pic.png"), b"incoming")];

        let report = organize(root, &entries);

        assert!(report.moved.is_empty());
        assert_eq!(report.collisions().count(), 1);
        assert_eq!(fs::read(root.join("Images/pic.png")).unwrap(), b"kept");
        assert!(root.join("pic.png").exists());
    }

    #[test]
    fn missing_source_does_not_stop_the_rest() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let gone = write_entry(&root.join("gone.pdf"), b"g");
        let kept = write_entry(&root.join("kept.txt"), b"k");
        fs::remove_file(gone.path()).unwrap();

        let report = organize(root, &[gone, kept]);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error.kind(), ErrorKind::NotFound);
        assert_eq!(report.moved.len(), 1);
        assert!(root.join("Documents/kept.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn blocked_category_folder_fails_its_entries_only() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        // a plain file where the folder should go
        fs::write(root.join("PDF"), b"not a dir").unwrap();
        let entries = vec![
            write_entry(&root.join("a.pdf"), b"a"),
            write_entry(&root.join("b.gif"), b"b"),
        ];

        let report = organize(root, &entries);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error.kind(), ErrorKind::Io);
        assert!(root.join("Images/b.gif").exists());
        assert!(root.join("a.pdf").exists());
    }
}
