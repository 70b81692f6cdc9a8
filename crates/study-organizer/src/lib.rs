pub mod classifier;
pub mod config;
pub mod error;
pub mod index;
pub mod library;
pub mod organizer;
pub mod query;
pub mod scanner;
pub mod stats;
pub mod types;

pub use classifier::{classify, classify_path};
pub use config::{Config, DEFAULT_PROGRESS_CAPACITY};
pub use error::{ErrorKind, LibraryError, Result};
pub use index::LibraryIndex;
pub use library::{FolderIngest, IngestFailure, MaterialsLibrary};
pub use organizer::{organize, plan_moves, Move, OrganizeFailure, OrganizeReport, PlannedMove};
pub use query::{query, CategoryFilter, Query, QueryParseError, SortKey};
pub use scanner::{find_duplicates, format_size, hash_file};
pub use stats::{aggregate, LibraryStats};
pub use types::{Category, LibraryEntry, UnknownCategory};
