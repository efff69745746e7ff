//! # Website Memory
//!
//! A local-first search and ranking pipeline over a browser's website
//! memory: the pages a user has visited, bookmarked, or saved to a
//! reading list, together with the knowledge (entities, topics, actions)
//! extracted from them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │ Browser     │──▶│   Import      │──▶│  SQLite    │
//! │ export JSON │   │ normalize    │   │ FTS5 index │
//! └─────────────┘   └──────────────┘   └─────┬─────┘
//!                                            │
//!                       ┌────────────────────┤
//!                       ▼                    ▼
//!                  ┌──────────┐       ┌───────────┐
//!                  │  search  │       │  resolve  │
//!                  │ + rank   │       │ (one URL) │
//!                  └──────────┘       └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! wmem init                         # create database
//! wmem import export.json           # load a browser export
//! wmem search "rust async traits"   # ranked search
//! wmem resolve "that pasta recipe"  # single best URL
//! wmem stats                        # index overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_index`] | SQLite/FTS5 knowledge index backend |
//! | [`import`] | Browser export ingestion |
//! | [`analyze`] | LLM query intent classification |
//! | [`enhance`] | LLM answer enhancement |
//! | [`llm`] | Shared chat-completion client |
//!
//! The provider-independent pipeline (search, dedup, ranking, context)
//! lives in the `website_memory_core` crate.

pub mod analyze;
pub mod config;
pub mod db;
pub mod enhance;
pub mod import;
pub mod llm;
pub mod migrate;
pub mod resolve_cmd;
pub mod search_cmd;
pub mod sqlite_index;
pub mod stats;
