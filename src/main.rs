//! # Website Memory CLI (`wmem`)
//!
//! The `wmem` binary is the primary interface for Website Memory. It
//! provides commands for database initialization, browser export
//! ingestion, ranked search, single-URL resolution, and index stats.
//!
//! ## Usage
//!
//! ```bash
//! wmem --config ./config/wmem.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wmem init` | Create the SQLite database and run schema migrations |
//! | `wmem import <file>` | Load pages from a browser export JSON file |
//! | `wmem search "<query>"` | Search remembered pages, ranked by intent |
//! | `wmem resolve "<description>"` | Resolve a page description to one URL |
//! | `wmem stats` | Show index size and per-source breakdowns |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! wmem init --config ./config/wmem.toml
//!
//! # Load a browser export
//! wmem import ~/Downloads/export.json
//!
//! # Ranked search with metadata filters
//! wmem search "sourdough recipe" --filter cooking.example.com
//!
//! # Skip LLM intent analysis
//! wmem search "rust async traits" --no-analysis
//!
//! # Find the single most likely URL for a vague description
//! wmem resolve "that article about borrow checking"
//! ```

mod analyze;
mod config;
mod db;
mod enhance;
mod import;
mod llm;
mod migrate;
mod resolve_cmd;
mod search_cmd;
mod sqlite_index;
mod stats;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Website Memory CLI — local search over the pages you've already seen.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/wmem.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "wmem",
    about = "Website Memory — search and ranking over remembered web pages",
    version,
    long_about = "Website Memory indexes the pages a browser remembers (history, bookmarks, \
    reading list) together with extracted knowledge, and answers natural-language queries \
    with ranked results, pattern summaries, and optional LLM-driven intent analysis."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/wmem.toml`. Index, retrieval, and LLM
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/wmem.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (pages, page_chunks, knowledge_refs, refs_fts).
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Load pages from a browser export JSON file.
    ///
    /// Reads an array of page records, normalizes them (deriving the
    /// domain from the URL when missing), and upserts them by URL.
    /// Re-importing an updated export refreshes existing pages in place.
    Import {
        /// Path to the export JSON file.
        file: PathBuf,
    },

    /// Search remembered pages.
    ///
    /// Runs semantic retrieval over the knowledge index, summarizes
    /// result patterns, optionally classifies the query's intent with
    /// an LLM, and re-ranks accordingly.
    Search {
        /// The search query string.
        query: String,

        /// Metadata filter terms (domain, title, folder, page type).
        /// May be repeated; matching results score higher.
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Require exact (case-sensitive) fragment matches.
        #[arg(long)]
        exact: bool,

        /// Minimum relevance score for retrieved matches (0.0 to 1.0).
        #[arg(long)]
        min_score: Option<f64>,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,

        /// Skip LLM intent analysis and keep relevance ordering.
        #[arg(long)]
        no_analysis: bool,
    },

    /// Resolve a page description to a single URL.
    ///
    /// Finds the best-matching remembered page, weighting recency and
    /// visit frequency, and prints its URL (or "No match.").
    Resolve {
        /// Natural-language description of the page.
        query: String,
    },

    /// Show index statistics.
    ///
    /// Page, chunk, and fragment counts, knowledge coverage, and
    /// per-source and per-domain breakdowns.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            import::run_import(&cfg, &file).await?;
        }
        Commands::Search {
            query,
            filters,
            exact,
            min_score,
            limit,
            no_analysis,
        } => {
            search_cmd::run_search(&cfg, &query, &filters, exact, min_score, limit, no_analysis)
                .await?;
        }
        Commands::Resolve { query } => {
            resolve_cmd::run_resolve(&cfg, &query).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
