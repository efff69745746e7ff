//! The `wmem search` command.
//!
//! Ties the pipeline together: semantic search against the SQLite
//! index, context summarization, optional intent classification and
//! intent-driven re-ranking, optional answer enhancement, and printing.

use std::collections::HashMap;

use anyhow::Result;

use website_memory_core::context::build_context;
use website_memory_core::rank::{rank_by_analysis, QueryAnalysis};
use website_memory_core::search::{search, SearchOptions};

use crate::analyze;
use crate::config::Config;
use crate::db;
use crate::enhance;
use crate::sqlite_index::SqliteIndex;

#[allow(clippy::too_many_arguments)]
pub async fn run_search(
    config: &Config,
    query: &str,
    filters: &[String],
    exact: bool,
    min_score: Option<f64>,
    limit: Option<usize>,
    no_analysis: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let index = SqliteIndex::new(pool);

    let options = SearchOptions {
        exact_match: exact,
        min_score: min_score.unwrap_or(config.retrieval.min_score),
    };

    let hits = search(&index, query, filters, &options).await;
    if hits.is_empty() {
        println!("No results.");
        index.pool().close().await;
        return Ok(());
    }

    // Scores by URL, for display after ranking reorders the pages.
    let scores: HashMap<String, f64> = hits
        .iter()
        .map(|h| (h.page.url.clone(), h.score))
        .collect();
    let pages: Vec<_> = hits.into_iter().map(|h| h.page).collect();

    let context = build_context(query, &pages);

    let analysis = if no_analysis {
        None
    } else {
        analyze::classify(&config.analysis, query, &context).await
    };

    if let Some(analysis) = &analysis {
        println!(
            "Intent: {} ({})",
            serde_json::to_string(&analysis.intent)?.trim_matches('"'),
            analysis.description
        );
        println!();
    }

    let mut ranked = match &analysis {
        Some(analysis) => rank_by_analysis(pages, analysis),
        None => pages,
    };
    ranked.truncate(limit.unwrap_or(config.retrieval.final_limit));

    for (i, page) in ranked.iter().enumerate() {
        let title_display = if page.metadata.title.is_empty() {
            "(untitled)"
        } else {
            &page.metadata.title
        };
        let score = scores.get(&page.url).copied().unwrap_or(0.0);

        println!("{}. [{:.2}] {}", i + 1, score, title_display);
        println!("    url: {}", page.url);
        println!(
            "    source: {} / {}",
            page.metadata.source.as_str(),
            page.metadata.domain
        );
        if let Some(date) = page.interaction_date() {
            println!("    last seen: {}", date.format("%Y-%m-%d"));
        }
        if !page.metadata.snippet.is_empty() {
            println!(
                "    excerpt: \"{}\"",
                page.metadata.snippet.replace('\n', " ").trim()
            );
        }
        println!();
    }

    if !context.patterns.dominant_domains.is_empty() {
        let domains: Vec<String> = context
            .patterns
            .dominant_domains
            .iter()
            .map(|d| format!("{} ({})", d.domain, d.count))
            .collect();
        println!("Domains: {}", domains.join(", "));
    }
    if let Some(range) = &context.patterns.time_range {
        println!(
            "Seen between {} and {}",
            range.earliest.format("%Y-%m-%d"),
            range.latest.format("%Y-%m-%d")
        );
    }

    if config.enhancement.is_enabled() {
        let analysis = analysis.unwrap_or_else(QueryAnalysis::passthrough);
        if let Some(enhancement) =
            enhance::generate_enhancement(&config.enhancement, query, &analysis, &context).await
        {
            println!();
            println!("Summary: {}", enhancement.summary);
            for followup in &enhancement.followups {
                println!("  - {}", followup);
            }
        }
    }

    index.pool().close().await;
    Ok(())
}
