//! Core data models for indexed web pages.
//!
//! These types represent the pages, metadata, and extracted knowledge that
//! flow through the search and ranking pipeline. Metadata is fully typed —
//! optional fields model absence explicitly, and validation happens at the
//! index boundary (import), never inside the ranking core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an indexed page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteSource {
    Bookmark,
    History,
    ReadingList,
}

impl WebsiteSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bookmark => "bookmark",
            Self::History => "history",
            Self::ReadingList => "reading_list",
        }
    }
}

/// Typed page metadata captured at index time.
///
/// Date fields are optional because browser exports are uneven: history
/// entries carry `last_visited`/`visit_date`, bookmarks carry
/// `bookmark_date`, and imported reading-list items often carry neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub domain: String,
    pub snippet: String,
    pub visit_count: Option<i64>,
    pub last_visited: Option<DateTime<Utc>>,
    pub visit_date: Option<DateTime<Utc>>,
    pub bookmark_date: Option<DateTime<Utc>>,
    pub source: WebsiteSource,
    /// Bookmark folder path, when the page came from a bookmark.
    pub folder: Option<String>,
    /// Coarse page classification (e.g. `"documentation"`, `"article"`).
    pub page_type: Option<String>,
}

/// A named entity extracted from page content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(alias = "entityType")]
    pub entity_type: String,
}

/// A topic extracted from page content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
}

/// A subject–predicate–object relationship between extracted entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// An action the page describes or affords (e.g. "download installer").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub verb: String,
    pub object: String,
}

/// Structured knowledge extracted from a page.
///
/// Present only when extraction has run for the page; all collections
/// default to empty so partially extracted records deserialize cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageKnowledge {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// An indexed web page: the unit of search, dedup, and ranking.
///
/// `url` is the stable identity — two candidates with the same URL
/// collapse to the single highest-scoring one. Nothing in the core
/// mutates an `IndexedPage` after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedPage {
    pub url: String,
    pub metadata: PageMetadata,
    pub knowledge: Option<PageKnowledge>,
    /// Raw extracted text segments, used to estimate content richness.
    #[serde(default)]
    pub text_chunks: Vec<String>,
}

impl IndexedPage {
    /// First non-empty interaction date: `last_visited`, then
    /// `visit_date`, then `bookmark_date`.
    pub fn interaction_date(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .last_visited
            .or(self.metadata.visit_date)
            .or(self.metadata.bookmark_date)
    }
}
