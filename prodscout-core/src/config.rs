//! Configuration system for Prodscout.
//!
//! Uses `figment` for layered configuration: built-in defaults ->
//! user config file -> environment. The user config lives at
//! `~/.config/prodscout/config.toml`; environment variables use the
//! `PRODSCOUT_` prefix with `__` as the section separator
//! (e.g. `PRODSCOUT_LLM__MODEL`).
//!
//! API credentials never live in the config file; each service section
//! names the environment variable that holds its bearer token.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for Prodscout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    pub llm: LlmConfig,
    pub video: VideoConfig,
    pub web_search: WebSearchConfig,
}

/// Configuration for the chat-completion language model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Maximum tokens to generate in a response.
    pub max_tokens: usize,
    /// Default temperature for generation.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4-1106-preview".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Configuration for video search and transcript fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Base URL of the video search API.
    pub search_base_url: String,
    /// Environment variable name containing the video search API key.
    pub api_key_env: String,
    /// Maximum videos fetched per product.
    pub max_results: usize,
    /// URL of the transcript extraction service.
    pub transcript_url: String,
    /// Environment variable name containing the transcript service key.
    pub transcript_key_env: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            search_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            api_key_env: "YOUTUBE_API_KEY".to_string(),
            max_results: 3,
            transcript_url: "https://flasktest-production-b8ba.up.railway.app/run".to_string(),
            transcript_key_env: "TRANSCRIPT_API_KEY".to_string(),
        }
    }
}

/// Configuration for the web-search summarization service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// Base URL of the search-backed chat completion endpoint.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Maximum tokens per summary.
    pub max_tokens: usize,
    /// Temperature for summarization.
    pub temperature: f32,
    /// Recency window applied to search results ("day", "week", "month").
    pub recency_filter: String,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            model: "llama-3.1-sonar-small-128k-online".to_string(),
            api_key_env: "PERPLEXITY_API_KEY".to_string(),
            max_tokens: 1500,
            temperature: 0.2,
            recency_filter: "month".to_string(),
        }
    }
}

/// Load configuration with layering (highest priority last):
///
/// 1. Built-in defaults
/// 2. User config (`~/.config/prodscout/config.toml`)
/// 3. Environment variables (`PRODSCOUT_LLM__MODEL`, ...)
pub fn load_config() -> Result<ScoutConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ScoutConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "prodscout", "prodscout") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    figment = figment.merge(Env::prefixed("PRODSCOUT_").split("__"));

    figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
}

/// Resolve an API key from the environment variable a config names.
pub fn resolve_api_key(var: &str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::EnvVarMissing {
            var: var.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_constants() {
        let config = ScoutConfig::default();
        assert_eq!(config.llm.model, "gpt-4-1106-preview");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.video.max_results, 3);
        assert_eq!(config.web_search.max_tokens, 1500);
        assert_eq!(config.web_search.recency_filter, "month");
    }

    #[test]
    fn env_layer_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PRODSCOUT_LLM__MODEL", "gpt-4o-mini");
            jail.set_env("PRODSCOUT_VIDEO__MAX_RESULTS", "5");
            let config: ScoutConfig = Figment::from(Serialized::defaults(ScoutConfig::default()))
                .merge(Env::prefixed("PRODSCOUT_").split("__"))
                .extract()?;
            assert_eq!(config.llm.model, "gpt-4o-mini");
            assert_eq!(config.video.max_results, 5);
            Ok(())
        });
    }

    #[test]
    fn toml_layer_merges_partial_sections() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [web_search]
                recency_filter = "week"
                "#,
            )?;
            let config: ScoutConfig = Figment::from(Serialized::defaults(ScoutConfig::default()))
                .merge(Toml::file("config.toml"))
                .extract()?;
            assert_eq!(config.web_search.recency_filter, "week");
            // Untouched fields keep their defaults.
            assert_eq!(config.web_search.max_tokens, 1500);
            Ok(())
        });
    }

    #[test]
    fn missing_key_env_is_an_error() {
        let err = resolve_api_key("PRODSCOUT_TEST_KEY_THAT_IS_NOT_SET").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarMissing { .. }));
    }
}
