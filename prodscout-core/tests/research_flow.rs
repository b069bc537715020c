//! End-to-end orchestration tests with mock service clients.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use prodscout_core::diagnostics::{ApiLog, ApiService, LogSink};
use prodscout_core::error::ApiError;
use prodscout_core::llm::LanguageModel;
use prodscout_core::research::Researcher;
use prodscout_core::types::{
    FeatureSet, Product, ProductComparison, ProductInfo, ProductRecommendations, VideoResult,
};
use prodscout_core::video::VideoSource;
use prodscout_core::websearch::{SearchFocus, WebSearch};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const REPORT_JSON: &str = r#"{
    "introduction": "intro",
    "features": [{"name": "battery", "importance": "Very Important", "analysis": "holds up"}],
    "limitations": ["price"],
    "conclusion": "buy it"
}"#;

struct MockLlm {
    analyze_calls: AtomicUsize,
}

impl MockLlm {
    fn new() -> Self {
        Self {
            analyze_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LanguageModel for MockLlm {
    async fn analyze_videos(
        &self,
        product: &str,
        _features: &FeatureSet,
        transcripts: &[String],
    ) -> Result<String, ApiError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "analysis of {} transcripts for {product}",
            transcripts.len()
        ))
    }

    async fn final_report(
        &self,
        _product: &str,
        _features: &FeatureSet,
        _video_analysis: &str,
        _website_summary: &str,
        _forum_summary: &str,
    ) -> Result<String, ApiError> {
        Ok(REPORT_JSON.to_string())
    }

    async fn product_info(&self, _product_name: &str) -> Result<ProductInfo, ApiError> {
        unimplemented!("not exercised by research runs")
    }

    async fn product_comparisons(
        &self,
        _product_name: &str,
    ) -> Result<ProductComparison, ApiError> {
        unimplemented!("not exercised by research runs")
    }

    async fn product_recommendations(
        &self,
        _description: &str,
    ) -> Result<ProductRecommendations, ApiError> {
        unimplemented!("not exercised by research runs")
    }
}

/// Video source with canned per-product results.
struct MockVideo {
    videos: HashMap<String, Vec<VideoResult>>,
    transcripts: HashMap<String, String>,
    /// Product name whose search fails after recording a log entry.
    fail_on: Option<String>,
    logs: LogSink,
}

fn video(id: &str, title: &str) -> VideoResult {
    VideoResult {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        analysis: String::new(),
    }
}

#[async_trait]
impl VideoSource for MockVideo {
    async fn search(&self, product_name: &str) -> Result<Vec<VideoResult>, ApiError> {
        if self.fail_on.as_deref() == Some(product_name) {
            self.logs.record(
                ApiLog::get(ApiService::VideoSearch, "search")
                    .with_response(500, Some(json!("boom")))
                    .with_error("upstream exploded"),
            );
            return Err(ApiError::Http {
                status: 500,
                message: "upstream exploded".to_string(),
            });
        }
        Ok(self.videos.get(product_name).cloned().unwrap_or_default())
    }

    async fn transcripts(&self, video_ids: &[String]) -> Result<HashMap<String, String>, ApiError> {
        Ok(video_ids
            .iter()
            .filter_map(|id| Some((id.clone(), self.transcripts.get(id)?.clone())))
            .collect())
    }
}

struct MockWeb;

#[async_trait]
impl WebSearch for MockWeb {
    async fn summarize(&self, query: &str, focus: SearchFocus) -> Result<String, ApiError> {
        let slice = match focus {
            SearchFocus::ExcludeForums => "web",
            SearchFocus::ForumsOnly => "forum",
        };
        Ok(format!("{slice} summary for: {query}"))
    }
}

fn researcher(video: MockVideo, llm: Arc<MockLlm>, logs: LogSink) -> Researcher {
    Researcher::new(llm, Arc::new(video), Arc::new(MockWeb), logs)
}

fn stocked_video(logs: &LogSink) -> MockVideo {
    let mut videos = HashMap::new();
    videos.insert(
        "ThinkPad X1".to_string(),
        vec![video("v1", "X1 review"), video("v2", "X1 long term")],
    );
    videos.insert("MacBook Air".to_string(), vec![video("v3", "Air review")]);
    let mut transcripts = HashMap::new();
    transcripts.insert("v1".to_string(), "great battery".to_string());
    transcripts.insert("v2".to_string(), "   ".to_string());
    transcripts.insert("v3".to_string(), "light and fast".to_string());
    MockVideo {
        videos,
        transcripts,
        fail_on: None,
        logs: logs.clone(),
    }
}

fn features() -> FeatureSet {
    FeatureSet {
        very_important: vec!["battery life".into()],
        important: vec!["weight".into()],
    }
}

#[tokio::test]
async fn single_product_produces_one_report() {
    let logs = LogSink::new();
    let llm = Arc::new(MockLlm::new());
    let r = researcher(stocked_video(&logs), llm.clone(), logs);

    let results = r.run_single("ThinkPad X1", &features()).await.unwrap();
    assert_eq!(results.reports.len(), 1);

    let report = &results.reports[0];
    assert_eq!(report.product_name, "ThinkPad X1");
    // v2's transcript is blank, so only v1 survives.
    assert_eq!(report.video_results.len(), 1);
    assert_eq!(report.video_results[0].id, "v1");
    assert_eq!(
        report.video_results[0].analysis,
        "analysis of 1 transcripts for ThinkPad X1"
    );
    assert!(report.website_summary.starts_with("web summary"));
    assert!(report.forum_summary.starts_with("forum summary"));
    assert_eq!(report.report, REPORT_JSON);
}

#[tokio::test]
async fn zero_videos_fails_fast_without_llm_calls() {
    let logs = LogSink::new();
    let llm = Arc::new(MockLlm::new());
    let r = researcher(stocked_video(&logs), llm.clone(), logs);

    let err = r.run_single("Unknown Gadget", &features()).await.unwrap_err();
    assert_eq!(err.message, "no videos found for Unknown Gadget");
    assert_eq!(llm.analyze_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn all_blank_transcripts_abort_the_product() {
    let logs = LogSink::new();
    let mut video_source = stocked_video(&logs);
    video_source
        .transcripts
        .insert("v1".to_string(), "".to_string());
    let llm = Arc::new(MockLlm::new());
    let r = researcher(video_source, llm.clone(), logs);

    let err = r.run_single("ThinkPad X1", &features()).await.unwrap_err();
    assert_eq!(
        err.message,
        "no valid video transcripts available for ThinkPad X1"
    );
    assert_eq!(llm.analyze_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn multi_product_run_aggregates_in_order_and_skips_sentinel() {
    let logs = LogSink::new();
    let llm = Arc::new(MockLlm::new());
    let r = researcher(stocked_video(&logs), llm.clone(), logs);

    let products = vec![
        Product::new("ThinkPad X1"),
        Product::new("Features"),
        Product::new("MacBook Air"),
    ];
    let results = r.run(&products, &features()).await.unwrap();

    assert_eq!(results.reports.len(), 2);
    assert_eq!(results.reports[0].product_name, "ThinkPad X1");
    assert_eq!(results.reports[1].product_name, "MacBook Air");
    assert_eq!(llm.analyze_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn batch_failure_carries_accumulated_logs() {
    let logs = LogSink::new();
    let mut video_source = stocked_video(&logs);
    video_source.fail_on = Some("MacBook Air".to_string());
    let llm = Arc::new(MockLlm::new());
    let r = researcher(video_source, llm.clone(), logs);

    let products = vec![Product::new("ThinkPad X1"), Product::new("MacBook Air")];
    let err = r.run(&products, &features()).await.unwrap_err();

    assert_eq!(err.message, "HTTP 500: upstream exploded");
    assert_eq!(err.logs.len(), 1);
    assert_eq!(err.logs[0].endpoint, "search");
    assert_eq!(err.logs[0].error.as_deref(), Some("upstream exploded"));
    // The recorded entry keeps the response status for the detail view.
    assert_eq!(err.logs[0].response.as_ref().unwrap().status, 500);
}
