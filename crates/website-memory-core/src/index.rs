//! Knowledge-index abstraction.
//!
//! The [`KnowledgeIndex`] trait defines the boundary to the external
//! semantic index that stores pages and their extracted knowledge. The
//! orchestrator only ever talks to this trait, enabling pluggable
//! backends (SQLite FTS, in-memory, remote services).
//!
//! The contract keeps the two-hop reference shape of the underlying
//! index: a semantic query returns matches against *knowledge fragments*
//! (title, text chunk, entity, topic, …), each identified by a
//! semantic-ref ordinal; a second lookup resolves the fragment to its
//! owning page. Multiple fragments of the same page may match one query —
//! the orchestrator is responsible for collapsing them.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::IndexedPage;

/// Boolean combinator for a group of search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Or,
    And,
}

/// A single search term.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    pub text: String,
}

/// A group of terms combined under one boolean operator.
#[derive(Debug, Clone)]
pub struct SearchTermGroup {
    pub boolean_op: BooleanOp,
    pub terms: Vec<SearchTerm>,
}

impl SearchTermGroup {
    pub fn or(terms: Vec<SearchTerm>) -> Self {
        Self {
            boolean_op: BooleanOp::Or,
            terms,
        }
    }
}

/// A semantic match against one knowledge fragment.
///
/// `score` is the index's relevance estimate in `[0.0, 1.0]`. The
/// ordinal points at a fragment, not a page; resolve it via
/// [`KnowledgeIndex::resolve_page_ordinal`].
#[derive(Debug, Clone)]
pub struct SemanticRefMatch {
    pub semantic_ref_ordinal: i64,
    pub score: f64,
}

/// Abstract semantic index over pages and their extracted knowledge.
#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    /// Query the index with a term group, returning fragment matches.
    ///
    /// With `exact_match`, terms must match verbatim (phrase semantics);
    /// otherwise the backend may match loosely. Match order is the
    /// backend's relevance order and is observed by the orchestrator's
    /// stable tie-breaking, so it must be deterministic for a fixed
    /// index snapshot.
    async fn search_knowledge(
        &self,
        group: &SearchTermGroup,
        exact_match: bool,
    ) -> Result<Vec<SemanticRefMatch>>;

    /// Resolve a fragment ordinal to its owning page ordinal.
    ///
    /// Returns `Ok(None)` for a stale reference; the caller skips the
    /// match and continues.
    async fn resolve_page_ordinal(&self, semantic_ref_ordinal: i64) -> Result<Option<i64>>;

    /// Fetch a full page record by page ordinal.
    async fn get_page(&self, page_ordinal: i64) -> Result<Option<IndexedPage>>;
}
