//! The `wmem resolve` command: turn a page description into a single URL.

use anyhow::Result;

use website_memory_core::search::resolve_url_with_history;

use crate::config::Config;
use crate::db;
use crate::sqlite_index::SqliteIndex;

pub async fn run_resolve(config: &Config, query: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let index = SqliteIndex::new(pool);

    let resolved =
        resolve_url_with_history(&index, query, config.retrieval.resolve_threshold).await;

    match resolved {
        Some(url) => println!("{url}"),
        None => println!("No match."),
    }

    index.pool().close().await;
    Ok(())
}
