use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create pages table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pages (
            ordinal INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL DEFAULT '',
            domain TEXT NOT NULL DEFAULT '',
            snippet TEXT NOT NULL DEFAULT '',
            visit_count INTEGER,
            last_visited INTEGER,
            visit_date INTEGER,
            bookmark_date INTEGER,
            source TEXT NOT NULL DEFAULT 'history',
            folder TEXT,
            page_type TEXT,
            knowledge_json TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create page_chunks table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS page_chunks (
            page_ordinal INTEGER NOT NULL,
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            UNIQUE(page_ordinal, chunk_index),
            FOREIGN KEY (page_ordinal) REFERENCES pages(ordinal)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create knowledge_refs table - one row per indexable fragment
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS knowledge_refs (
            ordinal INTEGER PRIMARY KEY AUTOINCREMENT,
            page_ordinal INTEGER NOT NULL,
            kind TEXT NOT NULL,
            text TEXT NOT NULL,
            FOREIGN KEY (page_ordinal) REFERENCES pages(ordinal)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create FTS5 virtual table over knowledge refs
    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='refs_fts'",
    )
    .fetch_one(&pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE refs_fts USING fts5(
                ref_ordinal UNINDEXED,
                page_ordinal UNINDEXED,
                text
            )
            "#,
        )
        .execute(&pool)
        .await?;
    }

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_refs_page_ordinal ON knowledge_refs(page_ordinal)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_page_ordinal ON page_chunks(page_ordinal)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pages_domain ON pages(domain)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
