//! # Website Memory Core
//!
//! Shared logic for Website Memory: page data models, the knowledge-index
//! abstraction, the search orchestrator, the result-context builder, and
//! the metadata ranker.
//!
//! This crate contains no database, HTTP, or filesystem dependencies.
//! The calling application provides a [`index::KnowledgeIndex`]
//! implementation and (optionally) a classified [`rank::QueryAnalysis`];
//! everything else here is deterministic, request-scoped computation.

pub mod context;
pub mod index;
pub mod models;
pub mod rank;
pub mod search;
