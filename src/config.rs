use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub analysis: LlmConfig,
    #[serde(default)]
    pub enhancement: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Minimum semantic match score for a fragment to qualify.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Baseline score for single-URL resolution.
    #[serde(default = "default_resolve_threshold")]
    pub resolve_threshold: f64,
    /// Maximum results displayed by `wmem search`.
    #[serde(default = "default_final_limit")]
    pub final_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            resolve_threshold: default_resolve_threshold(),
            final_limit: default_final_limit(),
        }
    }
}

fn default_min_score() -> f64 {
    0.5
}
fn default_resolve_threshold() -> f64 {
    0.3
}
fn default_final_limit() -> usize {
    10
}

/// Shared provider settings for the LLM collaborators
/// (intent classification and answer enhancement).
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate retrieval
    if !(0.0..=1.0).contains(&config.retrieval.min_score) {
        anyhow::bail!("retrieval.min_score must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.retrieval.resolve_threshold) {
        anyhow::bail!("retrieval.resolve_threshold must be in [0.0, 1.0]");
    }
    if config.retrieval.final_limit < 1 {
        anyhow::bail!("retrieval.final_limit must be >= 1");
    }

    // Validate LLM providers
    for (section, llm) in [
        ("analysis", &config.analysis),
        ("enhancement", &config.enhancement),
    ] {
        match llm.provider.as_str() {
            "disabled" | "openai" => {}
            other => anyhow::bail!(
                "Unknown {} provider: '{}'. Must be disabled or openai.",
                section,
                other
            ),
        }
        if llm.is_enabled() && llm.model.is_none() {
            anyhow::bail!(
                "{}.model must be specified when provider is '{}'",
                section,
                llm.provider
            );
        }
    }

    Ok(config)
}
