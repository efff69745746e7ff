//! SQLite-backed [`KnowledgeIndex`] implementation.
//!
//! Pages live in the `pages` table; every indexable fragment of a page
//! (title, text chunk, entity, topic, relationship, action) gets a row
//! in `knowledge_refs` mirrored into the `refs_fts` FTS5 table. A
//! semantic query is an FTS5 MATCH over fragments ordered by bm25 rank,
//! with the rank mapped into the `[0, 1)` score range the orchestrator
//! expects via `x / (1 + x)`.
//!
//! Stale refs and missing pages resolve to `Ok(None)` — the orchestrator
//! skips them and keeps going.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

use website_memory_core::index::{
    BooleanOp, KnowledgeIndex, SearchTermGroup, SemanticRefMatch,
};
use website_memory_core::models::{IndexedPage, PageKnowledge, PageMetadata, WebsiteSource};

pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace a page and all its derived fragments.
    ///
    /// Returns the page ordinal. Re-importing a URL replaces the page
    /// row, its chunks, and its fragments. The whole replacement runs
    /// in one transaction, so a failed re-import leaves the previous
    /// version of the page intact and searchable.
    pub async fn upsert_page(&self, page: &IndexedPage) -> Result<i64> {
        let meta = &page.metadata;
        let knowledge_json = page
            .knowledge
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pages
                (url, title, domain, snippet, visit_count, last_visited,
                 visit_date, bookmark_date, source, folder, page_type, knowledge_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                domain = excluded.domain,
                snippet = excluded.snippet,
                visit_count = excluded.visit_count,
                last_visited = excluded.last_visited,
                visit_date = excluded.visit_date,
                bookmark_date = excluded.bookmark_date,
                source = excluded.source,
                folder = excluded.folder,
                page_type = excluded.page_type,
                knowledge_json = excluded.knowledge_json
            "#,
        )
        .bind(&page.url)
        .bind(&meta.title)
        .bind(&meta.domain)
        .bind(&meta.snippet)
        .bind(meta.visit_count)
        .bind(meta.last_visited.map(|d| d.timestamp()))
        .bind(meta.visit_date.map(|d| d.timestamp()))
        .bind(meta.bookmark_date.map(|d| d.timestamp()))
        .bind(meta.source.as_str())
        .bind(&meta.folder)
        .bind(&meta.page_type)
        .bind(&knowledge_json)
        .execute(&mut *tx)
        .await?;

        let ordinal: i64 = sqlx::query_scalar("SELECT ordinal FROM pages WHERE url = ?")
            .bind(&page.url)
            .fetch_one(&mut *tx)
            .await?;

        replace_chunks(&mut *tx, ordinal, &page.text_chunks).await?;
        replace_fragments(&mut *tx, ordinal, page).await?;

        tx.commit().await?;
        Ok(ordinal)
    }
}

async fn replace_chunks(
    tx: &mut SqliteConnection,
    ordinal: i64,
    chunks: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM page_chunks WHERE page_ordinal = ?")
        .bind(ordinal)
        .execute(&mut *tx)
        .await?;

    for (index, text) in chunks.iter().enumerate() {
        sqlx::query("INSERT INTO page_chunks (page_ordinal, chunk_index, text) VALUES (?, ?, ?)")
            .bind(ordinal)
            .bind(index as i64)
            .bind(text)
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

async fn replace_fragments(
    tx: &mut SqliteConnection,
    ordinal: i64,
    page: &IndexedPage,
) -> Result<()> {
    sqlx::query("DELETE FROM refs_fts WHERE page_ordinal = ?")
        .bind(ordinal)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM knowledge_refs WHERE page_ordinal = ?")
        .bind(ordinal)
        .execute(&mut *tx)
        .await?;

    let mut fragments: Vec<(&str, String)> = Vec::new();
    if !page.metadata.title.is_empty() {
        fragments.push(("title", page.metadata.title.clone()));
    }
    for chunk in &page.text_chunks {
        if !chunk.is_empty() {
            fragments.push(("chunk", chunk.clone()));
        }
    }
    if let Some(knowledge) = &page.knowledge {
        for e in &knowledge.entities {
            fragments.push(("entity", e.name.clone()));
        }
        for t in &knowledge.topics {
            fragments.push(("topic", t.name.clone()));
        }
        for r in &knowledge.relationships {
            fragments.push((
                "relationship",
                format!("{} {} {}", r.subject, r.predicate, r.object),
            ));
        }
        for a in &knowledge.actions {
            fragments.push(("action", format!("{} {}", a.verb, a.object)));
        }
    }

    for (kind, text) in fragments {
        let ref_ordinal: i64 = sqlx::query_scalar(
            "INSERT INTO knowledge_refs (page_ordinal, kind, text) VALUES (?, ?, ?) RETURNING ordinal",
        )
        .bind(ordinal)
        .bind(kind)
        .bind(&text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO refs_fts (ref_ordinal, page_ordinal, text) VALUES (?, ?, ?)")
            .bind(ref_ordinal)
            .bind(ordinal)
            .bind(&text)
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

/// Build an FTS5 MATCH expression from a term group.
///
/// Terms are quoted as phrases (embedded quotes doubled); loose mode
/// appends a prefix star so partial tokens still match.
fn build_match_expr(group: &SearchTermGroup, exact_match: bool) -> String {
    let joiner = match group.boolean_op {
        BooleanOp::Or => " OR ",
        BooleanOp::And => " AND ",
    };
    group
        .terms
        .iter()
        .map(|t| {
            let quoted = format!("\"{}\"", t.text.replace('"', "\"\""));
            if exact_match {
                quoted
            } else {
                format!("{quoted}*")
            }
        })
        .collect::<Vec<_>>()
        .join(joiner)
}

fn parse_ts(value: Option<i64>) -> Option<DateTime<Utc>> {
    value.and_then(|ts| DateTime::from_timestamp(ts, 0))
}

fn parse_source(value: &str) -> WebsiteSource {
    match value {
        "bookmark" => WebsiteSource::Bookmark,
        "reading_list" => WebsiteSource::ReadingList,
        _ => WebsiteSource::History,
    }
}

#[async_trait]
impl KnowledgeIndex for SqliteIndex {
    async fn search_knowledge(
        &self,
        group: &SearchTermGroup,
        exact_match: bool,
    ) -> Result<Vec<SemanticRefMatch>> {
        if group.terms.is_empty() {
            return Ok(Vec::new());
        }
        let expr = build_match_expr(group, exact_match);

        let rows = sqlx::query(
            r#"
            SELECT ref_ordinal, rank
            FROM refs_fts
            WHERE refs_fts MATCH ?
            ORDER BY rank, ref_ordinal
            "#,
        )
        .bind(&expr)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let rank: f64 = row.get("rank");
                // bm25 rank: lower (more negative) is better.
                let x = (-rank).max(0.0);
                SemanticRefMatch {
                    semantic_ref_ordinal: row.get("ref_ordinal"),
                    score: x / (1.0 + x),
                }
            })
            .collect())
    }

    async fn resolve_page_ordinal(&self, semantic_ref_ordinal: i64) -> Result<Option<i64>> {
        let ordinal: Option<i64> =
            sqlx::query_scalar("SELECT page_ordinal FROM knowledge_refs WHERE ordinal = ?")
                .bind(semantic_ref_ordinal)
                .fetch_optional(&self.pool)
                .await?;
        Ok(ordinal)
    }

    async fn get_page(&self, page_ordinal: i64) -> Result<Option<IndexedPage>> {
        let row = sqlx::query("SELECT * FROM pages WHERE ordinal = ?")
            .bind(page_ordinal)
            .fetch_optional(&self.pool)
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let chunk_rows = sqlx::query(
            "SELECT text FROM page_chunks WHERE page_ordinal = ? ORDER BY chunk_index",
        )
        .bind(page_ordinal)
        .fetch_all(&self.pool)
        .await?;
        let text_chunks: Vec<String> = chunk_rows.iter().map(|r| r.get("text")).collect();

        let knowledge: Option<PageKnowledge> = row
            .get::<Option<String>, _>("knowledge_json")
            .and_then(|json| serde_json::from_str(&json).ok());

        let source: String = row.get("source");

        Ok(Some(IndexedPage {
            url: row.get("url"),
            metadata: PageMetadata {
                title: row.get("title"),
                domain: row.get("domain"),
                snippet: row.get("snippet"),
                visit_count: row.get("visit_count"),
                last_visited: parse_ts(row.get("last_visited")),
                visit_date: parse_ts(row.get("visit_date")),
                bookmark_date: parse_ts(row.get("bookmark_date")),
                source: parse_source(&source),
                folder: row.get("folder"),
                page_type: row.get("page_type"),
            },
            knowledge,
            text_chunks,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, IndexConfig};
    use crate::{db, migrate};
    use website_memory_core::index::{SearchTerm, SearchTermGroup};

    fn group(texts: &[&str], op: BooleanOp) -> SearchTermGroup {
        SearchTermGroup {
            boolean_op: op,
            terms: texts
                .iter()
                .map(|t| SearchTerm {
                    text: t.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn match_expr_quotes_and_joins() {
        let g = group(&["rust async", "tokio"], BooleanOp::Or);
        assert_eq!(build_match_expr(&g, true), "\"rust async\" OR \"tokio\"");
        assert_eq!(build_match_expr(&g, false), "\"rust async\"* OR \"tokio\"*");
    }

    #[test]
    fn match_expr_escapes_embedded_quotes() {
        let g = group(&["say \"hi\""], BooleanOp::And);
        assert_eq!(build_match_expr(&g, true), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn source_parsing_defaults_to_history() {
        assert_eq!(parse_source("bookmark"), WebsiteSource::Bookmark);
        assert_eq!(parse_source("reading_list"), WebsiteSource::ReadingList);
        assert_eq!(parse_source("garbage"), WebsiteSource::History);
    }

    fn sample_page(title: &str) -> IndexedPage {
        IndexedPage {
            url: "https://a.example/book".to_string(),
            metadata: PageMetadata {
                title: title.to_string(),
                domain: "a.example".to_string(),
                snippet: String::new(),
                visit_count: None,
                last_visited: None,
                visit_date: None,
                bookmark_date: None,
                source: WebsiteSource::History,
                folder: None,
                page_type: None,
            },
            knowledge: None,
            text_chunks: vec!["A chapter about async Rust.".to_string()],
        }
    }

    #[tokio::test]
    async fn failed_reimport_leaves_previous_page_intact() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            index: IndexConfig {
                path: dir.path().join("wmem.sqlite"),
            },
            retrieval: Default::default(),
            analysis: Default::default(),
            enhancement: Default::default(),
        };
        migrate::run_migrations(&config).await.unwrap();

        let index = SqliteIndex::new(db::connect(&config).await.unwrap());
        let ordinal = index
            .upsert_page(&sample_page("Rust async book"))
            .await
            .unwrap();

        // Break a child table so the next upsert fails mid-replacement,
        // after the transaction has already issued its deletes.
        sqlx::query("DROP TABLE page_chunks")
            .execute(index.pool())
            .await
            .unwrap();
        let result = index.upsert_page(&sample_page("Renamed edition")).await;
        assert!(result.is_err());

        // Restore the schema; the failed upsert must have rolled back.
        migrate::run_migrations(&config).await.unwrap();

        let page = index.get_page(ordinal).await.unwrap().unwrap();
        assert_eq!(page.metadata.title, "Rust async book");

        let kept = index
            .search_knowledge(&group(&["Rust async book"], BooleanOp::Or), false)
            .await
            .unwrap();
        assert!(!kept.is_empty());

        let replaced = index
            .search_knowledge(&group(&["Renamed"], BooleanOp::Or), false)
            .await
            .unwrap();
        assert!(replaced.is_empty());
    }
}
