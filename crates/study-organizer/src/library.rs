use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{LibraryError, Result};
use crate::index::LibraryIndex;
use crate::organizer::{organize, OrganizeReport};
use crate::scanner::find_duplicates;
use crate::stats::{aggregate, LibraryStats};
use crate::types::LibraryEntry;

/// Owns the managed root directory and the index of the files in it.
///
/// Mutating operations take `&mut self`; callers sharing a library across
/// threads must wrap it in their own lock.
pub struct MaterialsLibrary {
    config: Config,
    index: LibraryIndex,
}

#[derive(Debug)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: LibraryError,
}

#[derive(Debug, Default)]
pub struct FolderIngest {
    pub ingested: Vec<LibraryEntry>,
    pub failures: Vec<IngestFailure>,
}

impl FolderIngest {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Copied {
    Written(u64),
    TargetExists,
}

impl MaterialsLibrary {
    /// Opens the library at `config.library_path`, creating the directory if needed.
    ///
    /// The index starts empty; call [`rescan`](Self::rescan) to load existing files.
    pub fn open(config: Config) -> Result<Self> {
        let root = ensure_root(&config.library_path)?;
        Ok(Self {
            config: Config {
                library_path: root,
                ..config
            },
            index: LibraryIndex::new(),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(Config::new(path))
    }

    pub fn root(&self) -> &Path {
        &self.config.library_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&LibraryEntry> {
        self.index.get(path)
    }

    /// Point-in-time copy of every indexed entry.
    pub fn entries(&self) -> Vec<LibraryEntry> {
        self.index.snapshot()
    }

    /// Copies `source` to `root/<base name>` and indexes it.
    ///
    /// A file already present at the target is never overwritten: its entry is
    /// returned instead, whatever its content. A target occupied by anything
    /// other than a regular file (a category folder, a symlink) is an `Io`
    /// failure and nothing is indexed.
    pub fn ingest_file(&mut self, source: &Path) -> Result<LibraryEntry> {
        let file_name = source.file_name().ok_or_else(|| {
            LibraryError::io(source, invalid_input("source path has no file name"))
        })?;
        let target = self.root().join(file_name);

        if let Ok(metadata) = target.symlink_metadata() {
            if !metadata.file_type().is_file() {
                return Err(LibraryError::io(&target, occupied()));
            }
            debug!(
                source = %source.display(),
                target = %target.display(),
                "name already in library"
            );
            return self.existing_entry(&target);
        }

        ensure_root(self.root())?;

        match copy_new(source, &target)? {
            Copied::Written(size) => {
                // a stale entry can survive an external delete
                self.index.remove(&target);
                let entry = LibraryEntry::new(target, size, Utc::now());
                debug!(
                    path = %entry.path().display(),
                    category = %entry.category(),
                    size,
                    "ingested file"
                );
                Ok(self.index.insert(entry).clone())
            }
            Copied::TargetExists => self.existing_entry(&target),
        }
    }

    pub fn ingest_folder(&mut self, dir: &Path) -> FolderIngest {
        self.ingest_folder_with(dir, |_| {})
    }

    /// Walks `dir` depth-first and ingests every file, calling `on_file` before each.
    ///
    /// Failures are collected per file and never stop the walk. Anything
    /// already inside the managed root is skipped.
    pub fn ingest_folder_with(
        &mut self,
        dir: &Path,
        mut on_file: impl FnMut(&Path),
    ) -> FolderIngest {
        let mut result = FolderIngest::default();

        let dir = match fs::canonicalize(dir) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "cannot read folder");
                result.failures.push(IngestFailure {
                    path: dir.to_path_buf(),
                    error: LibraryError::io(dir, e),
                });
                return result;
            }
        };

        let root = self.root().to_path_buf();
        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.path().starts_with(&root));

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(dir.as_path()).to_path_buf();
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("filesystem loop"));
                    warn!(path = %path.display(), error = %source, "skipping unreadable entry");
                    result.failures.push(IngestFailure {
                        error: LibraryError::io(&path, source),
                        path,
                    });
                    continue;
                }
            };

            if entry.path().is_dir() {
                continue;
            }

            on_file(entry.path());
            match self.ingest_file(entry.path()) {
                Ok(ingested) => result.ingested.push(ingested),
                Err(error) => {
                    warn!(path = %entry.path().display(), %error, "failed to ingest file");
                    result.failures.push(IngestFailure {
                        path: entry.into_path(),
                        error,
                    });
                }
            }
        }

        info!(
            folder = %dir.display(),
            ingested = result.ingested.len(),
            failed = result.failures.len(),
            "ingested folder"
        );
        result
    }

    /// Rebuilds the index from every regular file under the root.
    ///
    /// Add times are not persisted, so every entry is stamped with the scan time.
    pub fn rescan(&mut self) -> Result<usize> {
        let root = ensure_root(self.root())?;
        self.index.clear();

        let now = Utc::now();
        for item in WalkDir::new(&root).sort_by_file_name() {
            match item {
                Ok(entry) if entry.file_type().is_file() => match entry.metadata() {
                    Ok(metadata) => {
                        self.index
                            .insert(LibraryEntry::new(entry.into_path(), metadata.len(), now));
                    }
                    Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping file"),
                },
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping unreadable entry"),
            }
        }

        info!(root = %root.display(), entries = self.index.len(), "rescanned library");
        Ok(self.index.len())
    }

    /// Turns a user-supplied path into the form the index is keyed by.
    ///
    /// Relative paths are taken from the root. The parent directory is
    /// canonicalized when it exists, so `..` parts and symlinked folders
    /// resolve to the same key as the indexed entry.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        };

        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => fs::canonicalize(parent)
                .map(|parent| parent.join(name))
                .unwrap_or(path),
            _ => path,
        }
    }

    /// Deletes the file at `path` and drops its entry.
    pub fn remove(&mut self, path: &Path) -> Result<LibraryEntry> {
        if !self.index.contains(path) {
            return Err(LibraryError::NotFound(path.to_path_buf()));
        }

        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed file");
                self.index
                    .remove(path)
                    .ok_or_else(|| LibraryError::NotFound(path.to_path_buf()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(LibraryError::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(LibraryError::io(path, e)),
        }
    }

    /// Moves every indexed file into its category folder.
    ///
    /// The index is left untouched and is stale afterwards; call
    /// [`rescan`](Self::rescan) to pick up the new paths.
    pub fn organize(&self) -> OrganizeReport {
        organize(self.root(), self.index.entries())
    }

    pub fn stats(&self) -> LibraryStats {
        aggregate(self.index.entries(), self.config.progress_capacity)
    }

    pub fn duplicates(&self) -> Vec<Vec<LibraryEntry>> {
        find_duplicates(self.index.entries())
    }

    fn existing_entry(&mut self, target: &Path) -> Result<LibraryEntry> {
        if let Some(entry) = self.index.get(target) {
            return Ok(entry.clone());
        }
        let entry = LibraryEntry::from_file(target).map_err(|e| LibraryError::io(target, e))?;
        Ok(self.index.insert(entry).clone())
    }
}

fn ensure_root(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|e| LibraryError::io(path, e))?;
    fs::canonicalize(path).map_err(|e| LibraryError::io(path, e))
}

/// Copies `source` into a file that must not exist yet, removing it again on failure.
fn copy_new(source: &Path, target: &Path) -> Result<Copied> {
    let metadata = fs::metadata(source).map_err(|e| LibraryError::io(source, e))?;
    if !metadata.is_file() {
        return Err(LibraryError::io(
            source,
            invalid_input("not a regular file"),
        ));
    }

    let mut reader = File::open(source).map_err(|e| LibraryError::io(source, e))?;
    let writer = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(Copied::TargetExists),
        Err(e) => return Err(LibraryError::io(target, e)),
    };

    fill_new(&mut reader, writer, target)
        .map(Copied::Written)
        .map_err(|e| LibraryError::io(source, e))
}

/// Streams `reader` into the just-created `target`, deleting `target` if the copy fails.
fn fill_new(reader: &mut impl Read, mut writer: File, target: &Path) -> io::Result<u64> {
    match io::copy(reader, &mut writer) {
        Ok(size) => Ok(size),
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(target) {
                warn!(path = %target.display(), error = %cleanup, "failed to remove partial copy");
            }
            Err(e)
        }
    }
}

fn invalid_input(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.to_string())
}

fn occupied() -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        "target name is taken by something other than a regular file",
    )
}
