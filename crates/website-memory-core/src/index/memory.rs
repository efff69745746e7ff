//! In-memory [`KnowledgeIndex`] implementation for testing.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety. Semantic
//! search is approximated by term overlap: each page contributes one
//! fragment per title, text chunk, entity, topic, relationship, and
//! action, and a fragment's score is the fraction of query terms it
//! contains. Exact-match mode requires case-sensitive containment.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::IndexedPage;

use super::{BooleanOp, KnowledgeIndex, SearchTermGroup, SemanticRefMatch};

struct Fragment {
    page_ordinal: i64,
    text: String,
}

/// In-memory index for tests and embedding-free usage.
#[derive(Default)]
pub struct InMemoryIndex {
    pages: RwLock<Vec<IndexedPage>>,
    fragments: RwLock<Vec<Fragment>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page, deriving one searchable fragment per knowledge item.
    ///
    /// Returns the page ordinal.
    pub fn add_page(&self, page: IndexedPage) -> i64 {
        let mut pages = self.pages.write().unwrap();
        let ordinal = pages.len() as i64;

        let mut fragments = self.fragments.write().unwrap();
        let mut push = |text: &str| {
            if !text.is_empty() {
                fragments.push(Fragment {
                    page_ordinal: ordinal,
                    text: text.to_string(),
                });
            }
        };

        push(&page.metadata.title);
        for chunk in &page.text_chunks {
            push(chunk);
        }
        if let Some(knowledge) = &page.knowledge {
            for e in &knowledge.entities {
                push(&e.name);
            }
            for t in &knowledge.topics {
                push(&t.name);
            }
            for r in &knowledge.relationships {
                push(&format!("{} {} {}", r.subject, r.predicate, r.object));
            }
            for a in &knowledge.actions {
                push(&format!("{} {}", a.verb, a.object));
            }
        }

        pages.push(page);
        ordinal
    }

    pub fn page_count(&self) -> usize {
        self.pages.read().unwrap().len()
    }
}

fn term_matches(fragment: &str, term: &str, exact: bool) -> bool {
    if exact {
        fragment.contains(term)
    } else {
        fragment.to_lowercase().contains(&term.to_lowercase())
    }
}

#[async_trait]
impl KnowledgeIndex for InMemoryIndex {
    async fn search_knowledge(
        &self,
        group: &SearchTermGroup,
        exact_match: bool,
    ) -> Result<Vec<SemanticRefMatch>> {
        if group.terms.is_empty() {
            return Ok(Vec::new());
        }

        let fragments = self.fragments.read().unwrap();
        let total = group.terms.len() as f64;

        let mut matches: Vec<SemanticRefMatch> = fragments
            .iter()
            .enumerate()
            .filter_map(|(ordinal, fragment)| {
                let matched = group
                    .terms
                    .iter()
                    .filter(|t| term_matches(&fragment.text, &t.text, exact_match))
                    .count();
                let qualifies = match group.boolean_op {
                    BooleanOp::Or => matched > 0,
                    BooleanOp::And => matched == group.terms.len(),
                };
                if qualifies {
                    Some(SemanticRefMatch {
                        semantic_ref_ordinal: ordinal as i64,
                        score: matched as f64 / total,
                    })
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.semantic_ref_ordinal.cmp(&b.semantic_ref_ordinal))
        });

        Ok(matches)
    }

    async fn resolve_page_ordinal(&self, semantic_ref_ordinal: i64) -> Result<Option<i64>> {
        let fragments = self.fragments.read().unwrap();
        Ok(fragments
            .get(semantic_ref_ordinal as usize)
            .map(|f| f.page_ordinal))
    }

    async fn get_page(&self, page_ordinal: i64) -> Result<Option<IndexedPage>> {
        let pages = self.pages.read().unwrap();
        Ok(pages.get(page_ordinal as usize).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchTerm;
    use crate::models::{PageKnowledge, PageMetadata, Topic, WebsiteSource};

    fn make_page(url: &str, title: &str, topics: &[&str]) -> IndexedPage {
        IndexedPage {
            url: url.to_string(),
            metadata: PageMetadata {
                title: title.to_string(),
                domain: "example.com".to_string(),
                snippet: String::new(),
                visit_count: None,
                last_visited: None,
                visit_date: None,
                bookmark_date: None,
                source: WebsiteSource::History,
                folder: None,
                page_type: None,
            },
            knowledge: Some(PageKnowledge {
                topics: topics
                    .iter()
                    .map(|t| Topic {
                        name: t.to_string(),
                    })
                    .collect(),
                ..Default::default()
            }),
            text_chunks: Vec::new(),
        }
    }

    fn terms(texts: &[&str]) -> SearchTermGroup {
        SearchTermGroup::or(
            texts
                .iter()
                .map(|t| SearchTerm {
                    text: t.to_string(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn matches_title_and_topics() {
        let index = InMemoryIndex::new();
        index.add_page(make_page("https://a.example", "Rust async book", &["tokio"]));
        index.add_page(make_page("https://b.example", "Gardening tips", &["soil"]));

        let matches = index
            .search_knowledge(&terms(&["rust", "tokio"]), false)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2); // title fragment + topic fragment

        for m in &matches {
            let page_ord = index
                .resolve_page_ordinal(m.semantic_ref_ordinal)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(page_ord, 0);
        }
    }

    #[tokio::test]
    async fn exact_match_is_case_sensitive() {
        let index = InMemoryIndex::new();
        index.add_page(make_page("https://a.example", "Rust async book", &[]));

        let loose = index
            .search_knowledge(&terms(&["rust"]), false)
            .await
            .unwrap();
        assert_eq!(loose.len(), 1);

        let exact = index
            .search_knowledge(&terms(&["rust"]), true)
            .await
            .unwrap();
        assert!(exact.is_empty());
    }

    #[tokio::test]
    async fn stale_ref_resolves_to_none() {
        let index = InMemoryIndex::new();
        let resolved = index.resolve_page_ordinal(99).await.unwrap();
        assert!(resolved.is_none());
    }
}
