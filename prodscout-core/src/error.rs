//! Error types for the Prodscout core.
//!
//! Uses `thiserror` with structured variants covering the external
//! service calls, the research orchestration, and configuration.
//! Research entry points normalize everything into [`ResearchFailure`]
//! so the caller always gets a message plus the diagnostic log.

use crate::diagnostics::ApiLog;

/// Errors from a single external service call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {message}")]
    Request { message: String },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("response parse error: {message}")]
    ResponseParse { message: String },

    #[error("authentication failed for {service}")]
    AuthFailed { service: String },

    #[error("API quota exceeded; check your API key and billing status")]
    QuotaExceeded,

    #[error("too many requests; wait a moment before trying again")]
    RateLimited,
}

impl ApiError {
    /// Map an HTTP error status and body to the appropriate variant.
    ///
    /// 401 is an authentication failure, 429 is surfaced as rate limiting
    /// (no retry is attempted), and a body carrying an
    /// `insufficient_quota` error type wins over the status code.
    pub fn from_status(service: &str, status: u16, body: &str) -> Self {
        let quota = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                let kind = v.pointer("/error/type")?.as_str()?.to_string();
                Some(kind == "insufficient_quota")
            })
            .unwrap_or(false);
        if quota {
            return ApiError::QuotaExceeded;
        }
        match status {
            401 => ApiError::AuthFailed {
                service: service.to_string(),
            },
            429 => ApiError::RateLimited,
            _ => ApiError::Http {
                status,
                message: body.chars().take(500).collect(),
            },
        }
    }
}

/// Errors from the research orchestration pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("no videos found for {product}")]
    NoVideos { product: String },

    #[error("no valid video transcripts available for {product}")]
    NoTranscripts { product: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("configuration load error: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// The normalized failure surfaced to the caller of a research run.
///
/// Carries the diagnostic log accumulated up to the point of failure so
/// the frontend can show request/response details.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ResearchFailure {
    pub message: String,
    pub logs: Vec<ApiLog>,
}

impl ResearchFailure {
    pub fn new(message: impl Into<String>, logs: Vec<ApiLog>) -> Self {
        Self {
            message: message.into(),
            logs,
        }
    }
}
