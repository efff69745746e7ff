//! Search-context summarization.
//!
//! [`build_context`] condenses a result set into a compact
//! [`SearchContext`] for downstream consumers: the ranking heuristics
//! and the optional LLM answer enhancement. Output size is bounded for
//! token budgets — at most 10 summarized results, truncated titles and
//! snippets — while the aggregate patterns (dominant domains, time
//! range, knowledge flag) are computed over the full result set.
//!
//! Pure function, no I/O; missing fields degrade to defaults and never
//! cause an error.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{IndexedPage, WebsiteSource};

/// Maximum number of summarized results carried in a context.
const MAX_CONTEXT_RESULTS: usize = 10;
/// Title truncation length, in characters.
const MAX_TITLE_CHARS: usize = 100;
/// Snippet truncation length, in characters.
const MAX_SNIPPET_CHARS: usize = 200;
/// Number of dominant domains reported.
const MAX_DOMAINS: usize = 5;

/// A single summarized result within a [`SearchContext`].
#[derive(Debug, Clone, Serialize)]
pub struct ResultContext {
    pub url: String,
    pub title: String,
    pub domain: String,
    pub snippet: String,
    pub source: WebsiteSource,
    pub has_knowledge: bool,
}

/// Occurrence count for one domain across the result set.
#[derive(Debug, Clone, Serialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Earliest and latest interaction dates observed in the result set.
#[derive(Debug, Clone, Serialize)]
pub struct TimeRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

/// Aggregate patterns over the full result set.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPatterns {
    pub dominant_domains: Vec<DomainCount>,
    pub time_range: Option<TimeRange>,
    pub has_knowledge: bool,
}

/// Compact summary of one search, rebuilt fresh per query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchContext {
    pub query: String,
    pub total_results: usize,
    pub results: Vec<ResultContext>,
    pub patterns: ResultPatterns,
}

/// Truncate a string to `max_chars` characters, ellipsis-terminated.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Build a [`SearchContext`] from the ordered result list.
pub fn build_context(query: &str, results: &[IndexedPage]) -> SearchContext {
    let summarized: Vec<ResultContext> = results
        .iter()
        .take(MAX_CONTEXT_RESULTS)
        .map(|page| ResultContext {
            url: page.url.clone(),
            title: truncate(&page.metadata.title, MAX_TITLE_CHARS),
            domain: page.metadata.domain.clone(),
            snippet: truncate(&page.metadata.snippet, MAX_SNIPPET_CHARS),
            source: page.metadata.source,
            has_knowledge: page_has_knowledge(page),
        })
        .collect();

    // Domain frequency over *all* results, not just the summarized ones.
    let mut domain_counts: HashMap<&str, usize> = HashMap::new();
    for page in results {
        if !page.metadata.domain.is_empty() {
            *domain_counts.entry(page.metadata.domain.as_str()).or_insert(0) += 1;
        }
    }
    let mut dominant_domains: Vec<DomainCount> = domain_counts
        .into_iter()
        .map(|(domain, count)| DomainCount {
            domain: domain.to_string(),
            count,
        })
        .collect();
    dominant_domains.sort_by(|a, b| b.count.cmp(&a.count).then(a.domain.cmp(&b.domain)));
    dominant_domains.truncate(MAX_DOMAINS);

    let mut time_range: Option<TimeRange> = None;
    for page in results {
        if let Some(date) = page.interaction_date() {
            time_range = Some(match time_range {
                Some(range) => TimeRange {
                    earliest: range.earliest.min(date),
                    latest: range.latest.max(date),
                },
                None => TimeRange {
                    earliest: date,
                    latest: date,
                },
            });
        }
    }

    let has_knowledge = results.iter().any(page_has_knowledge);

    SearchContext {
        query: query.to_string(),
        total_results: results.len(),
        results: summarized,
        patterns: ResultPatterns {
            dominant_domains,
            time_range,
            has_knowledge,
        },
    }
}

fn page_has_knowledge(page: &IndexedPage) -> bool {
    page.knowledge
        .as_ref()
        .map(|k| !k.entities.is_empty() || !k.topics.is_empty())
        .unwrap_or(false)
}
