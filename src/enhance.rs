//! Optional LLM answer enhancement.
//!
//! Produces a natural-language summary and follow-up suggestions from
//! the search context and classified intent. Strictly additive: every
//! failure path returns `None`, and the caller prints the ranked
//! results either way.

use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

use website_memory_core::context::SearchContext;
use website_memory_core::rank::QueryAnalysis;

use crate::config::LlmConfig;
use crate::llm;

/// The enhancement block rendered under the ranked results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEnhancement {
    pub summary: String,
    #[serde(default)]
    pub followups: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}

const SYSTEM_PROMPT: &str = "\
You summarize search results from a personal archive of visited and \
bookmarked web pages. Given the query, its classified intent, and a \
compact result context, respond with strict JSON only:\n\
{\n\
  \"summary\": \"<2-3 sentences answering the query from the results>\",\n\
  \"followups\": [\"<suggested refinement>\", ...],\n\
  \"confidence\": <0.0-1.0>\n\
}";

/// Generate the enhancement, or `None` when disabled or on any failure.
pub async fn generate_enhancement(
    config: &LlmConfig,
    query: &str,
    analysis: &QueryAnalysis,
    context: &SearchContext,
) -> Option<SearchEnhancement> {
    if !config.is_enabled() {
        return None;
    }

    match enhance_inner(config, query, analysis, context).await {
        Ok(enhancement) => Some(enhancement),
        Err(err) => {
            warn!(error = %err, "answer enhancement failed; returning plain results");
            None
        }
    }
}

async fn enhance_inner(
    config: &LlmConfig,
    query: &str,
    analysis: &QueryAnalysis,
    context: &SearchContext,
) -> Result<SearchEnhancement> {
    let user = format!(
        "Query: {query}\nIntent: {}\n\nContext:\n{}",
        serde_json::to_string(&analysis.intent)?,
        serde_json::to_string(context)?
    );
    let content = llm::chat_completion(config, SYSTEM_PROMPT, &user).await?;
    parse_enhancement(&content)
}

fn parse_enhancement(content: &str) -> Result<SearchEnhancement> {
    let json = llm::strip_code_fence(content);
    let enhancement: SearchEnhancement = serde_json::from_str(json)?;
    Ok(enhancement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use website_memory_core::context::build_context;

    #[test]
    fn parses_enhancement() {
        let enhancement = parse_enhancement(
            r#"{
                "summary": "You visited the Tokio docs most often last week.",
                "followups": ["show only bookmarks"],
                "confidence": 0.8
            }"#,
        )
        .unwrap();
        assert_eq!(enhancement.followups.len(), 1);
        assert!((enhancement.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn missing_optional_fields_default() {
        let enhancement = parse_enhancement(r#"{"summary": "s"}"#).unwrap();
        assert!(enhancement.followups.is_empty());
        assert_eq!(enhancement.confidence, 0.0);
    }

    #[tokio::test]
    async fn disabled_provider_returns_none() {
        let config = LlmConfig::default();
        let context = build_context("q", &[]);
        let analysis = website_memory_core::rank::QueryAnalysis::passthrough();
        assert!(generate_enhancement(&config, "q", &analysis, &context)
            .await
            .is_none());
    }
}
