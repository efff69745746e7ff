//! Search orchestration over a [`KnowledgeIndex`].
//!
//! The core pipeline behind `wmem search`:
//!
//! 1. Build a disjunctive term group from the query and filter strings
//!    (full phrases plus individual tokens, to broaden recall).
//! 2. Issue one semantic query against the index.
//! 3. Resolve qualifying fragment matches to their owning pages,
//!    fetching each page once.
//! 4. Score each candidate: semantic match score plus a metadata bonus
//!    for filter hits on domain, title, URL, folder, and page type.
//! 5. Deduplicate by URL (MAX aggregation), stable-sort by total score
//!    descending.
//!
//! The operation is read-only and idempotent for a fixed index snapshot.
//! Index failures degrade to an empty result list — a broken index must
//! never fail the caller's larger action.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::index::{KnowledgeIndex, SearchTerm, SearchTermGroup};
use crate::models::{IndexedPage, PageMetadata, WebsiteSource};

/// Caller-supplied knobs for one search invocation.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Require verbatim term matches instead of loose containment.
    pub exact_match: bool,
    /// Minimum semantic match score for a fragment to qualify.
    pub min_score: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            exact_match: false,
            min_score: 0.5,
        }
    }
}

/// One ranked search result: the page plus its total score
/// (semantic match score + metadata bonus).
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub page: IndexedPage,
    pub score: f64,
}

/// Build the disjunctive term group for a query and its filters.
///
/// Each phrase contributes itself plus every whitespace token longer
/// than 2 characters; duplicates are collapsed case-insensitively.
pub fn build_search_terms(query: &str, filters: &[String]) -> SearchTermGroup {
    let mut seen: HashSet<String> = HashSet::new();
    let mut terms: Vec<SearchTerm> = Vec::new();

    let mut add = |text: &str| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if seen.insert(trimmed.to_lowercase()) {
            terms.push(SearchTerm {
                text: trimmed.to_string(),
            });
        }
    };

    let add_phrase = |add: &mut dyn FnMut(&str), phrase: &str| {
        add(phrase);
        for token in phrase.split_whitespace() {
            if token.chars().count() > 2 {
                add(token);
            }
        }
    };

    add_phrase(&mut add, query);
    for filter in filters {
        add_phrase(&mut add, filter);
    }

    SearchTermGroup::or(terms)
}

/// Metadata bonus for a candidate page, summed over all filter strings.
///
/// Case-insensitive containment awards: domain +1.0, title +0.8,
/// URL +0.4, bookmark folder +0.6 (bookmark source only), page type
/// +0.5.
pub fn metadata_bonus(filters: &[String], url: &str, metadata: &PageMetadata) -> f64 {
    let url_lower = url.to_lowercase();
    let domain_lower = metadata.domain.to_lowercase();
    let title_lower = metadata.title.to_lowercase();

    let mut bonus = 0.0;
    for filter in filters {
        let needle = filter.to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if domain_lower.contains(&needle) {
            bonus += 1.0;
        }
        if title_lower.contains(&needle) {
            bonus += 0.8;
        }
        if url_lower.contains(&needle) {
            bonus += 0.4;
        }
        if metadata.source == WebsiteSource::Bookmark {
            if let Some(folder) = &metadata.folder {
                if folder.to_lowercase().contains(&needle) {
                    bonus += 0.6;
                }
            }
        }
        if let Some(page_type) = &metadata.page_type {
            if page_type.to_lowercase().contains(&needle) {
                bonus += 0.5;
            }
        }
    }
    bonus
}

struct Candidate {
    page: IndexedPage,
    match_score: f64,
    bonus: f64,
}

impl Candidate {
    fn total(&self) -> f64 {
        self.match_score + self.bonus
    }
}

/// Run a search against the index, returning hits ordered by total
/// score descending (ties keep discovery order).
///
/// Index failures are logged and degrade to an empty result list.
pub async fn search<I: KnowledgeIndex + ?Sized>(
    index: &I,
    query: &str,
    filters: &[String],
    options: &SearchOptions,
) -> Vec<SearchHit> {
    let group = build_search_terms(query, filters);
    if group.terms.is_empty() {
        return Vec::new();
    }

    let matches = match index.search_knowledge(&group, options.exact_match).await {
        Ok(matches) => matches,
        Err(err) => {
            warn!(error = %err, "knowledge index query failed; returning no results");
            return Vec::new();
        }
    };

    // Page ordinal -> position in `candidates`. Each page is fetched
    // once; later matches for the same page only raise its match score.
    let mut by_ordinal: HashMap<i64, usize> = HashMap::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for m in matches {
        if m.score < options.min_score {
            continue;
        }

        let page_ordinal = match index.resolve_page_ordinal(m.semantic_ref_ordinal).await {
            Ok(Some(ordinal)) => ordinal,
            Ok(None) => {
                debug!(
                    semantic_ref_ordinal = m.semantic_ref_ordinal,
                    "skipping stale semantic ref"
                );
                continue;
            }
            Err(err) => {
                debug!(
                    semantic_ref_ordinal = m.semantic_ref_ordinal,
                    error = %err,
                    "skipping unresolvable semantic ref"
                );
                continue;
            }
        };

        if let Some(&pos) = by_ordinal.get(&page_ordinal) {
            if m.score > candidates[pos].match_score {
                candidates[pos].match_score = m.score;
            }
            continue;
        }

        let page = match index.get_page(page_ordinal).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                debug!(page_ordinal, "skipping match for missing page");
                continue;
            }
            Err(err) => {
                debug!(page_ordinal, error = %err, "skipping unfetchable page");
                continue;
            }
        };

        let bonus = metadata_bonus(filters, &page.url, &page.metadata);
        by_ordinal.insert(page_ordinal, candidates.len());
        candidates.push(Candidate {
            page,
            match_score: m.score,
            bonus,
        });
    }

    // Collapse distinct ordinals that share a URL, keeping the highest
    // total at the earliest discovery position.
    let mut by_url: HashMap<String, usize> = HashMap::new();
    let mut hits: Vec<Option<SearchHit>> = Vec::new();
    for candidate in candidates {
        let total = candidate.total();
        match by_url.get(&candidate.page.url) {
            Some(&pos) => {
                if let Some(existing) = &mut hits[pos] {
                    if total > existing.score {
                        existing.score = total;
                        existing.page = candidate.page;
                    }
                }
            }
            None => {
                by_url.insert(candidate.page.url.clone(), hits.len());
                hits.push(Some(SearchHit {
                    page: candidate.page,
                    score: total,
                }));
            }
        }
    }
    let mut hits: Vec<SearchHit> = hits.into_iter().flatten().collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    hits
}

/// Default baseline match score for single-URL resolution.
pub const RESOLVE_BASELINE: f64 = 0.3;

/// Recency bonus for URL resolution: +0.5 for an interaction within 7
/// days of `now`, +0.3 within 30 days.
pub fn recency_bonus(metadata: &PageMetadata, now: DateTime<Utc>) -> f64 {
    let interaction = metadata
        .last_visited
        .or(metadata.visit_date)
        .or(metadata.bookmark_date);
    match interaction {
        Some(date) => {
            let age = now.signed_duration_since(date);
            if age <= chrono::Duration::days(7) {
                0.5
            } else if age <= chrono::Duration::days(30) {
                0.3
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

/// Frequency bonus for URL resolution: `min(visit_count / 20, 0.5)`.
pub fn frequency_bonus(metadata: &PageMetadata) -> f64 {
    (metadata.visit_count.unwrap_or(0) as f64 / 20.0).min(0.5)
}

/// Resolve a site name or URL fragment to the single best-matching URL.
///
/// Same pipeline as [`search`], optimized for one answer: the query
/// doubles as the metadata filter, and recency and frequency bonuses
/// favor pages the user actually returns to. Matches below `baseline`
/// are ignored; returns `None` when nothing qualifies.
pub async fn resolve_url_with_history<I: KnowledgeIndex + ?Sized>(
    index: &I,
    query: &str,
    baseline: f64,
) -> Option<String> {
    let hits = search(
        index,
        query,
        &[query.to_string()],
        &SearchOptions {
            exact_match: false,
            min_score: baseline,
        },
    )
    .await;

    let now = Utc::now();
    let mut best: Option<(f64, String)> = None;
    for hit in hits {
        let total = hit.score + recency_bonus(&hit.page.metadata, now) + frequency_bonus(&hit.page.metadata);
        let better = match &best {
            Some((best_score, _)) => total > *best_score,
            None => true,
        };
        if better {
            best = Some((total, hit.page.url));
        }
    }
    best.map(|(_, url)| url)
}
