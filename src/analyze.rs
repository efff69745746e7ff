//! Query-intent classification.
//!
//! Asks the configured LLM provider to classify a search query into a
//! [`QueryAnalysis`]: what kind of answer the user wants and which
//! ranking strategy serves it. The classifier is strictly optional —
//! any failure (provider disabled, HTTP error, unparseable JSON) logs
//! a warning and returns `None`, and the search proceeds with plain
//! relevance ordering.

use anyhow::Result;
use tracing::warn;

use website_memory_core::context::SearchContext;
use website_memory_core::rank::QueryAnalysis;

use crate::config::LlmConfig;
use crate::llm;

const SYSTEM_PROMPT: &str = "\
You classify search queries over a personal archive of visited and \
bookmarked web pages. Respond with strict JSON only, no prose:\n\
{\n\
  \"intent\": \"find_latest\" | \"find_earliest\" | \"find_most_frequent\" | \"summarize\" | \"find_specific\",\n\
  \"description\": \"<one sentence>\",\n\
  \"ranking\": {\n\
    \"primary_factor\": \"date\" | \"frequency\" | \"composite\" | \"relevance\",\n\
    \"direction\": \"ascending\" | \"descending\",\n\
    \"source_preference\": \"bookmark\" | \"history\" | null\n\
  } | null\n\
}";

/// Classify a query, using the search context for disambiguation.
///
/// Returns `None` when the provider is disabled or anything fails.
pub async fn classify(
    config: &LlmConfig,
    query: &str,
    context: &SearchContext,
) -> Option<QueryAnalysis> {
    if !config.is_enabled() {
        return None;
    }

    match classify_inner(config, query, context).await {
        Ok(analysis) => Some(analysis),
        Err(err) => {
            warn!(error = %err, "intent classification failed; ranking by relevance");
            None
        }
    }
}

async fn classify_inner(
    config: &LlmConfig,
    query: &str,
    context: &SearchContext,
) -> Result<QueryAnalysis> {
    let user = format!(
        "Query: {query}\n\nResult overview (for disambiguation):\n{}",
        serde_json::to_string(&context.patterns)?
    );
    let content = llm::chat_completion(config, SYSTEM_PROMPT, &user).await?;
    parse_analysis(&content)
}

fn parse_analysis(content: &str) -> Result<QueryAnalysis> {
    let json = llm::strip_code_fence(content);
    let analysis: QueryAnalysis = serde_json::from_str(json)?;
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use website_memory_core::context::build_context;
    use website_memory_core::rank::{Direction, PrimaryFactor, QueryIntent};

    #[test]
    fn parses_full_analysis() {
        let analysis = parse_analysis(
            r#"{
                "intent": "find_latest",
                "description": "User wants the most recent page.",
                "ranking": {
                    "primary_factor": "composite",
                    "direction": "descending",
                    "source_preference": null
                }
            }"#,
        )
        .unwrap();
        assert_eq!(analysis.intent, QueryIntent::FindLatest);
        let ranking = analysis.ranking.unwrap();
        assert_eq!(ranking.primary_factor, PrimaryFactor::Composite);
        assert_eq!(ranking.direction, Direction::Descending);
    }

    #[test]
    fn parses_fenced_analysis() {
        let analysis = parse_analysis(
            "```json\n{\"intent\": \"summarize\", \"description\": \"\", \"ranking\": null}\n```",
        )
        .unwrap();
        assert_eq!(analysis.intent, QueryIntent::Summarize);
        assert!(analysis.ranking.is_none());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_analysis("the user probably wants the newest page").is_err());
    }

    #[tokio::test]
    async fn disabled_provider_returns_none() {
        let config = LlmConfig::default();
        let context = build_context("q", &[]);
        assert!(classify(&config, "q", &context).await.is_none());
    }
}
