//! Video search and transcript fetching.
//!
//! Talks to a YouTube-Data-v3-style search endpoint and a separate
//! transcript extraction service. Both are single best-effort requests;
//! a failure aborts the calling product's research.

use crate::config::{VideoConfig, resolve_api_key};
use crate::diagnostics::{ApiLog, ApiService, LogSink};
use crate::error::{ApiError, ConfigError};
use crate::types::VideoResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;

/// Source of review videos and their transcripts.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Search for review videos about a product.
    async fn search(&self, product_name: &str) -> Result<Vec<VideoResult>, ApiError>;

    /// Fetch transcripts for a batch of videos, keyed by video id.
    ///
    /// Videos without an available transcript are simply absent from the
    /// returned map.
    async fn transcripts(&self, video_ids: &[String]) -> Result<HashMap<String, String>, ApiError>;
}

/// HTTP implementation of [`VideoSource`].
pub struct VideoApi {
    client: Client,
    config: VideoConfig,
    api_key: String,
    transcript_key: String,
    logs: LogSink,
}

impl VideoApi {
    /// Create a client, resolving both API keys from the environment
    /// variables named in the config.
    pub fn new(config: VideoConfig, logs: LogSink) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        let transcript_key = resolve_api_key(&config.transcript_key_env)?;
        Ok(Self {
            client: Client::new(),
            config,
            api_key,
            transcript_key,
            logs,
        })
    }

    /// Parse a search response body into video results.
    ///
    /// `items` must be an array; absent snippet fields fall back to
    /// empty strings rather than failing the whole search.
    fn parse_search_response(body: &Value) -> Result<Vec<VideoResult>, ApiError> {
        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .ok_or_else(|| ApiError::ResponseParse {
                message: "invalid response format from video search API: missing 'items'"
                    .to_string(),
            })?;

        Ok(items
            .iter()
            .map(|item| VideoResult {
                id: item
                    .pointer("/id/videoId")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                title: item
                    .pointer("/snippet/title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                description: item
                    .pointer("/snippet/description")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                analysis: String::new(),
            })
            .collect())
    }

    /// Parse a transcript response body into an id -> transcript map.
    fn parse_transcript_response(body: &Value) -> Result<HashMap<String, String>, ApiError> {
        let map = body.as_object().ok_or_else(|| ApiError::ResponseParse {
            message: "invalid response format from transcript service: expected a JSON object"
                .to_string(),
        })?;

        Ok(map
            .iter()
            .filter_map(|(id, text)| Some((id.clone(), text.as_str()?.to_string())))
            .collect())
    }

    fn watch_url(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={id}")
    }
}

#[async_trait]
impl VideoSource for VideoApi {
    async fn search(&self, product_name: &str) -> Result<Vec<VideoResult>, ApiError> {
        let query = format!("{product_name} review");
        let url = format!(
            "{}/search?part=snippet&q={}&type=video&maxResults={}&key={}",
            self.config.search_base_url,
            urlencoding::encode(&query),
            self.config.max_results,
            self.api_key,
        );

        debug!(product = product_name, "searching review videos");
        let entry = ApiLog::get(ApiService::VideoSearch, "search");
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                self.logs.record(entry.with_error(e.to_string()));
                return Err(ApiError::Request {
                    message: format!("failed to fetch videos: {e}"),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.logs
                .record(entry.with_response(status.as_u16(), None).with_error(&body));
            return Err(ApiError::from_status("video_search", status.as_u16(), &body));
        }

        let body: Value = response.json().await.map_err(|e| ApiError::ResponseParse {
            message: format!("video search returned invalid JSON: {e}"),
        })?;
        self.logs
            .record(entry.with_response(status.as_u16(), Some(body.clone())));

        Self::parse_search_response(&body)
    }

    async fn transcripts(&self, video_ids: &[String]) -> Result<HashMap<String, String>, ApiError> {
        let url = format!("{}?clean_output=true", self.config.transcript_url);
        let urls: Vec<String> = video_ids.iter().map(|id| Self::watch_url(id)).collect();
        let payload = json!({ "urls": urls });

        debug!(count = video_ids.len(), "fetching video transcripts");
        let entry = ApiLog::post(ApiService::VideoSearch, "transcript", payload.clone());
        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.transcript_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                self.logs.record(entry.with_error(e.to_string()));
                return Err(ApiError::Request {
                    message: format!("failed to fetch transcripts: {e}"),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.logs
                .record(entry.with_response(status.as_u16(), None).with_error(&body));
            return Err(ApiError::from_status(
                "video_transcript",
                status.as_u16(),
                &body,
            ));
        }

        let body: Value = response.json().await.map_err(|e| ApiError::ResponseParse {
            message: format!("transcript service returned invalid JSON: {e}"),
        })?;
        self.logs.record(entry.with_response(
            status.as_u16(),
            Some(json!("batch transcripts retrieved")),
        ));

        Self::parse_transcript_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_maps_items() {
        let body = json!({
            "items": [
                {
                    "id": { "videoId": "abc123" },
                    "snippet": { "title": "Great review", "description": "In depth" }
                },
                {
                    "id": {},
                    "snippet": { "title": "No id" }
                }
            ]
        });
        let videos = VideoApi::parse_search_response(&body).unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "abc123");
        assert_eq!(videos[0].title, "Great review");
        // Absent fields default to empty rather than erroring.
        assert_eq!(videos[1].id, "");
        assert_eq!(videos[1].description, "");
    }

    #[test]
    fn search_response_without_items_is_rejected() {
        let body = json!({ "error": { "message": "quota" } });
        let err = VideoApi::parse_search_response(&body).unwrap_err();
        assert!(matches!(err, ApiError::ResponseParse { .. }));
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn transcript_response_maps_ids() {
        let body = json!({
            "abc123": "the full transcript",
            "def456": "another transcript",
            "ghi789": null
        });
        let map = VideoApi::parse_transcript_response(&body).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["abc123"], "the full transcript");
        assert!(!map.contains_key("ghi789"));
    }

    #[test]
    fn transcript_response_must_be_an_object() {
        let err = VideoApi::parse_transcript_response(&json!("plain text")).unwrap_err();
        assert!(matches!(err, ApiError::ResponseParse { .. }));
    }

    #[test]
    fn watch_urls_embed_the_id() {
        assert_eq!(
            VideoApi::watch_url("abc123"),
            "https://www.youtube.com/watch?v=abc123"
        );
    }
}
