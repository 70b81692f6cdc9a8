use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::{Category, LibraryEntry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryParseError {
    #[error("unknown category filter '{0}' (expected All, PDF, Images, Documents, Videos or Others)")]
    Category(String),
    #[error("unknown sort key '{0}' (expected Name, DateAdded, Size or Type)")]
    SortKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Category>()
            .map(Self::Only)
            .map_err(|_| QueryParseError::Category(s.to_string()))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(category) => write!(f, "{category}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    #[default]
    DateAdded,
    Size,
    Type,
}

impl FromStr for SortKey {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "name" => Ok(Self::Name),
            "dateadded" => Ok(Self::DateAdded),
            "size" => Ok(Self::Size),
            "type" => Ok(Self::Type),
            _ => Err(QueryParseError::SortKey(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "Name",
            Self::DateAdded => "DateAdded",
            Self::Size => "Size",
            Self::Type => "Type",
        })
    }
}

/// Search text, category filter and sort order for a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub category: CategoryFilter,
    pub sort: SortKey,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, entry: &LibraryEntry) -> bool {
        self.category.matches(entry.category()) && self.matches_text(entry)
    }

    pub fn apply(&self, entries: &[LibraryEntry]) -> Vec<LibraryEntry> {
        let mut results: Vec<LibraryEntry> = entries
            .iter()
            .filter(|e| self.matches(e))
            .cloned()
            .collect();

        results.sort_by(|a, b| compare(self.sort, a, b));
        results
    }

    fn matches_text(&self, entry: &LibraryEntry) -> bool {
        self.text.is_empty()
            || entry
                .display_name()
                .to_lowercase()
                .contains(&self.text.to_lowercase())
    }
}

pub fn query(
    entries: &[LibraryEntry],
    search_text: &str,
    category: CategoryFilter,
    sort: SortKey,
) -> Vec<LibraryEntry> {
    Query::new(search_text)
        .with_category(category)
        .with_sort(sort)
        .apply(entries)
}

fn compare(sort: SortKey, a: &LibraryEntry, b: &LibraryEntry) -> Ordering {
    match sort {
        SortKey::Name => a
            .display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase()),
        SortKey::Size => a.size().cmp(&b.size()),
        SortKey::Type => a
            .category()
            .label()
            .to_lowercase()
            .cmp(&b.category().label().to_lowercase()),
        // newest first
        SortKey::DateAdded => b.added_at().cmp(&a.added_at()),
    }
}
