//! Diagnostic API logging.
//!
//! Every external call appends an [`ApiLog`] entry to a shared
//! [`LogSink`]. The log has no semantic role; it exists so a failed run
//! can show the user exactly which requests were made and what came
//! back. Credentials are redacted before an entry is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Which external service produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiService {
    Llm,
    VideoSearch,
    WebSearch,
}

/// The request half of a log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedRequest {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// The response half of a log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// One recorded external call, request and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLog {
    pub timestamp: DateTime<Utc>,
    pub service: ApiService,
    pub endpoint: String,
    pub request: LoggedRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<LoggedResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiLog {
    /// Build a log entry for a JSON POST, stamping the current time and
    /// redacting the bearer token.
    pub fn post(service: ApiService, endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer [HIDDEN]".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            timestamp: Utc::now(),
            service,
            endpoint: endpoint.into(),
            request: LoggedRequest {
                method: "POST".to_string(),
                headers,
                body: Some(body),
            },
            response: None,
            error: None,
        }
    }

    /// Build a log entry for a GET request. The key-bearing query string
    /// must already be stripped by the caller.
    pub fn get(service: ApiService, endpoint: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            service,
            endpoint: endpoint.into(),
            request: LoggedRequest {
                method: "GET".to_string(),
                headers: BTreeMap::new(),
                body: None,
            },
            response: None,
            error: None,
        }
    }

    /// Attach a response to the entry.
    pub fn with_response(mut self, status: u16, body: Option<serde_json::Value>) -> Self {
        self.response = Some(LoggedResponse { status, body });
        self
    }

    /// Attach an error message to the entry.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// Cloneable handle to the shared diagnostic log.
///
/// Per-product research tasks run concurrently and append through their
/// own clone; the mutex makes the interleaving well-defined.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    entries: Arc<Mutex<Vec<ApiLog>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the shared log.
    pub fn record(&self, entry: ApiLog) {
        // A poisoned lock only means another task panicked mid-append;
        // the log itself is still usable for diagnostics.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(entry);
    }

    /// Clone the accumulated log, oldest first.
    pub fn snapshot(&self) -> Vec<ApiLog> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clone()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_entries_redact_authorization() {
        let entry = ApiLog::post(ApiService::Llm, "chat/completions", json!({"model": "x"}));
        assert_eq!(
            entry.request.headers.get("Authorization").unwrap(),
            "Bearer [HIDDEN]"
        );
    }

    #[test]
    fn sink_clones_share_entries() {
        let sink = LogSink::new();
        let clone = sink.clone();
        clone.record(ApiLog::get(ApiService::VideoSearch, "search"));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.snapshot()[0].endpoint, "search");
    }

    #[test]
    fn responses_and_errors_attach() {
        let entry = ApiLog::post(ApiService::WebSearch, "chat/completions", json!({}))
            .with_response(502, None)
            .with_error("upstream unavailable");
        assert_eq!(entry.response.as_ref().unwrap().status, 502);
        assert_eq!(entry.error.as_deref(), Some("upstream unavailable"));
    }

    #[test]
    fn snapshot_is_a_copy() {
        let sink = LogSink::new();
        sink.record(ApiLog::get(ApiService::VideoSearch, "search"));
        let snap = sink.snapshot();
        sink.record(ApiLog::get(ApiService::VideoSearch, "transcript"));
        assert_eq!(snap.len(), 1);
        assert_eq!(sink.len(), 2);
    }
}
