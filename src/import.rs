//! Import of exported browser history/bookmark data.
//!
//! `wmem import` is a thin I/O wrapper: it reads a JSON array of page
//! records (the browser extension's export format, camelCase fields),
//! validates each record at this boundary, and upserts pages into the
//! index. Records without a usable URL are skipped and counted, never
//! fatal. Re-importing a URL replaces the stored page.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use website_memory_core::models::{IndexedPage, PageKnowledge, PageMetadata, WebsiteSource};

use crate::config::Config;
use crate::db;
use crate::sqlite_index::SqliteIndex;

/// One record of the extension's export format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportRecord {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    website_source: Option<WebsiteSource>,
    #[serde(default)]
    visit_count: Option<i64>,
    #[serde(default)]
    last_visited: Option<DateTime<Utc>>,
    #[serde(default)]
    visit_date: Option<DateTime<Utc>>,
    #[serde(default)]
    bookmark_date: Option<DateTime<Utc>>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    page_type: Option<String>,
    #[serde(default)]
    text_chunks: Vec<String>,
    #[serde(default)]
    knowledge: Option<PageKnowledge>,
}

/// Derive the registrable host from a URL string.
fn domain_from_url(raw: &str) -> Option<String> {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

fn normalize(record: ExportRecord) -> Option<IndexedPage> {
    let domain = match record.domain.filter(|d| !d.is_empty()) {
        Some(domain) => domain,
        None => domain_from_url(&record.url)?,
    };

    Some(IndexedPage {
        url: record.url,
        metadata: PageMetadata {
            title: record.title,
            domain,
            snippet: record.snippet,
            visit_count: record.visit_count,
            last_visited: record.last_visited,
            visit_date: record.visit_date,
            bookmark_date: record.bookmark_date,
            source: record.website_source.unwrap_or(WebsiteSource::History),
            folder: record.folder,
            page_type: record.page_type,
        },
        knowledge: record.knowledge,
        text_chunks: record.text_chunks,
    })
}

/// Run the import command: parse the export file and upsert every page.
pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read export file: {}", path.display()))?;
    let records: Vec<ExportRecord> =
        serde_json::from_str(&content).with_context(|| "Failed to parse export file")?;

    let pool = db::connect(config).await?;
    let index = SqliteIndex::new(pool);

    let total = records.len();
    let mut imported = 0usize;
    let mut skipped = 0usize;

    for record in records {
        let url = record.url.clone();
        match normalize(record) {
            Some(page) => {
                index.upsert_page(&page).await?;
                imported += 1;
            }
            None => {
                warn!(url = %url, "skipping record with unusable URL");
                skipped += 1;
            }
        }
    }

    println!(
        "Imported {} of {} page{} ({} skipped).",
        imported,
        total,
        if total == 1 { "" } else { "s" },
        skipped
    );

    index.pool().close().await;
    Ok(())
}
