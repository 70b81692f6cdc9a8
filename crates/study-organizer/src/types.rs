use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::classifier::classify_path;
use crate::scanner::format_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "PDF")]
    Pdf,
    Images,
    Documents,
    Videos,
    Others,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Pdf,
        Self::Images,
        Self::Documents,
        Self::Videos,
        Self::Others,
    ];

    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" => Self::Images,
            "doc" | "docx" | "txt" | "rtf" => Self::Documents,
            "mp4" | "avi" | "mov" | "wmv" => Self::Videos,
            _ => Self::Others,
        }
    }

    /// Display label, also used as the subdirectory name when organizing.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Images => "Images",
            Self::Documents => "Documents",
            Self::Videos => "Videos",
            Self::Others => "Others",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pdf => "📄",
            Self::Images => "🖼️",
            Self::Documents => "📝",
            Self::Videos => "🎬",
            Self::Others => "📋",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// One managed file. Identity is the absolute path.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryEntry {
    path: PathBuf,
    category: Category,
    size: u64,
    added_at: DateTime<Utc>,
}

impl LibraryEntry {
    /// Builds an entry, classifying `path` by its current file name.
    pub fn new(path: PathBuf, size: u64, added_at: DateTime<Utc>) -> Self {
        let category = classify_path(&path);
        Self {
            path,
            category,
            size,
            added_at,
        }
    }

    /// Reads the size of an existing regular file and stamps the entry with the current time.
    ///
    /// Directories, symlinks and other special files are rejected with `InvalidInput`.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        if !metadata.file_type().is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        Ok(Self::new(path.to_path_buf(), metadata.len(), Utc::now()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn formatted_size(&self) -> String {
        format_size(self.size)
    }

    pub fn formatted_date(&self) -> String {
        self.added_at
            .with_timezone(&Local)
            .format("%b %d, %Y %H:%M")
            .to_string()
    }
}

impl PartialEq for LibraryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for LibraryEntry {}

impl Hash for LibraryEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for LibraryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}
