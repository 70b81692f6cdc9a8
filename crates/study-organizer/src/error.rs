use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} already exists, refusing to move {} over it", .to.display(), .from.display())]
    Collision { from: PathBuf, to: PathBuf },
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Collision,
    NotFound,
}

impl LibraryError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Collision { .. } => ErrorKind::Collision,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Path the failure is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
            Self::Collision { from, .. } => from,
            Self::NotFound(path) => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_message_names_path() {
        let err = LibraryError::io(
            "/lib/a.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("/lib/a.pdf"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn collision_reports_source_path() {
        let err = LibraryError::Collision {
            from: PathBuf::from("/lib/sub/a.pdf"),
            to: PathBuf::from("/lib/PDF/a.pdf"),
        };

        assert_eq!(err.kind(), ErrorKind::Collision);
        assert_eq!(err.path(), Path::new("/lib/sub/a.pdf"));
    }
}
