//! Search-backed web summaries.
//!
//! Wraps a Perplexity-style chat completion endpoint that answers with a
//! summary grounded in live web search. The same endpoint serves both
//! the general-web and the forum-focused queries; only the domain filter
//! differs.

use crate::config::{WebSearchConfig, resolve_api_key};
use crate::diagnostics::{ApiLog, ApiService, LogSink};
use crate::error::{ApiError, ConfigError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

/// Which slice of the web a summary should draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    /// Everything except discussion forums.
    ExcludeForums,
    /// Discussion forums only.
    ForumsOnly,
}

impl SearchFocus {
    fn domain_filter(self) -> Vec<&'static str> {
        match self {
            SearchFocus::ExcludeForums => vec!["-reddit.com"],
            SearchFocus::ForumsOnly => vec!["reddit.com"],
        }
    }
}

/// Web-search summarization service.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Summarize what the web says about a query.
    async fn summarize(&self, query: &str, focus: SearchFocus) -> Result<String, ApiError>;
}

/// HTTP implementation of [`WebSearch`].
pub struct WebSearchApi {
    client: Client,
    config: WebSearchConfig,
    api_key: String,
    logs: LogSink,
}

impl WebSearchApi {
    /// Create a client, resolving the API key from the environment
    /// variable named in the config.
    pub fn new(config: WebSearchConfig, logs: LogSink) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        Ok(Self {
            client: Client::new(),
            config,
            api_key,
            logs,
        })
    }

    fn build_payload(&self, query: &str, focus: SearchFocus) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": "Be precise and concise." },
                { "role": "user", "content": format!("{query} review") },
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "top_p": 0.9,
            "return_citations": true,
            "search_domain_filter": focus.domain_filter(),
            "return_images": false,
            "return_related_questions": false,
            "search_recency_filter": self.config.recency_filter,
            "top_k": 5,
            "stream": false,
            "presence_penalty": 0,
            "frequency_penalty": 1,
        })
    }

    /// Pull the summary text out of a chat-completion response body.
    fn parse_response(body: &Value) -> Result<String, ApiError> {
        body.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::ResponseParse {
                message: "invalid response format from web search API: missing message content"
                    .to_string(),
            })
    }
}

#[async_trait]
impl WebSearch for WebSearchApi {
    async fn summarize(&self, query: &str, focus: SearchFocus) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let payload = self.build_payload(query, focus);

        debug!(?focus, "requesting web summary");
        let entry = ApiLog::post(ApiService::WebSearch, "chat/completions", payload.clone());
        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                self.logs.record(entry.with_error(e.to_string()));
                return Err(ApiError::Request {
                    message: format!("web search request failed: {e}"),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.logs
                .record(entry.with_response(status.as_u16(), None).with_error(&body));
            return Err(ApiError::from_status("web_search", status.as_u16(), &body));
        }

        let body: Value = response.json().await.map_err(|e| ApiError::ResponseParse {
            message: format!("web search returned invalid JSON: {e}"),
        })?;
        self.logs
            .record(entry.with_response(status.as_u16(), Some(body.clone())));

        Self::parse_response(&body)
    }
}
