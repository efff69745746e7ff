//! Database statistics and health overview.
//!
//! Provides a quick summary of what's in local memory: page counts,
//! fragment counts, knowledge coverage, and per-source breakdowns. Used
//! by `wmem stats` to give confidence that imports are working as
//! expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-source breakdown of page and fragment counts.
struct SourceStats {
    source: String,
    page_count: i64,
    knowledge_count: i64,
    last_interaction_ts: Option<i64>,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_pages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages")
        .fetch_one(&pool)
        .await?;

    let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM page_chunks")
        .fetch_one(&pool)
        .await?;

    let total_refs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM knowledge_refs")
        .fetch_one(&pool)
        .await?;

    let with_knowledge: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pages WHERE knowledge_json IS NOT NULL")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.index.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Website Memory — Index Stats");
    println!("============================");
    println!();
    println!("  Database:    {}", config.index.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Pages:       {}", total_pages);
    println!("  Chunks:      {}", total_chunks);
    println!("  Fragments:   {}", total_refs);
    println!(
        "  Knowledge:   {} / {} ({}%)",
        with_knowledge,
        total_pages,
        if total_pages > 0 {
            (with_knowledge * 100) / total_pages
        } else {
            0
        }
    );

    // Per-source breakdown
    let source_rows = sqlx::query(
        r#"
        SELECT
            source,
            COUNT(*) AS page_count,
            COUNT(knowledge_json) AS knowledge_count,
            MAX(COALESCE(last_visited, visit_date, bookmark_date)) AS last_interaction
        FROM pages
        GROUP BY source
        ORDER BY page_count DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let mut source_stats: Vec<SourceStats> = Vec::new();
    for row in &source_rows {
        source_stats.push(SourceStats {
            source: row.get("source"),
            page_count: row.get("page_count"),
            knowledge_count: row.get("knowledge_count"),
            last_interaction_ts: row.get("last_interaction"),
        });
    }

    if !source_stats.is_empty() {
        println!();
        println!("  By source:");
        println!(
            "  {:<16} {:>6} {:>10}   {}",
            "SOURCE", "PAGES", "KNOWLEDGE", "LAST SEEN"
        );
        println!("  {}", "-".repeat(56));

        for s in &source_stats {
            let seen_display = match s.last_interaction_ts {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<16} {:>6} {:>10}   {}",
                s.source, s.page_count, s.knowledge_count, seen_display
            );
        }
    }

    // Top domains
    let domain_rows = sqlx::query(
        r#"
        SELECT domain, COUNT(*) AS page_count
        FROM pages
        WHERE domain != ''
        GROUP BY domain
        ORDER BY page_count DESC, domain ASC
        LIMIT 5
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !domain_rows.is_empty() {
        println!();
        println!("  Top domains:");
        for row in &domain_rows {
            let domain: String = row.get("domain");
            let count: i64 = row.get("page_count");
            println!("    {:<32} {}", domain, count);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
