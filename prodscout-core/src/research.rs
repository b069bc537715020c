//! Research orchestration.
//!
//! The per-product pipeline is strictly sequential: video search ->
//! transcripts -> LLM analysis -> web summary -> forum summary -> final
//! report. Independent products fan out in parallel and the batch is
//! all-or-nothing; any failure aborts the run and surfaces the
//! diagnostic log accumulated so far.

use crate::config::ScoutConfig;
use crate::diagnostics::LogSink;
use crate::error::{ConfigError, ResearchError, ResearchFailure};
use crate::llm::{LanguageModel, LlmApi};
use crate::types::{FeatureSet, Product, ProductReport, ResearchResults};
use crate::video::{VideoApi, VideoSource};
use crate::websearch::{SearchFocus, WebSearch, WebSearchApi};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, instrument};

/// Pseudo-product name the feature-entry step injects; never researched.
const FEATURES_SENTINEL: &str = "Features";

/// Orchestrates the three external services into per-product reports.
pub struct Researcher {
    llm: Arc<dyn LanguageModel>,
    video: Arc<dyn VideoSource>,
    web: Arc<dyn WebSearch>,
    logs: LogSink,
}

impl Researcher {
    /// Assemble a researcher from already-built service clients.
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        video: Arc<dyn VideoSource>,
        web: Arc<dyn WebSearch>,
        logs: LogSink,
    ) -> Self {
        Self {
            llm,
            video,
            web,
            logs,
        }
    }

    /// Build the HTTP service clients from configuration, sharing one
    /// diagnostic log across all of them.
    pub fn from_config(config: &ScoutConfig) -> Result<Self, ConfigError> {
        let logs = LogSink::new();
        let llm = LlmApi::new(config.llm.clone(), logs.clone())?;
        let video = VideoApi::new(config.video.clone(), logs.clone())?;
        let web = WebSearchApi::new(config.web_search.clone(), logs.clone())?;
        Ok(Self::new(
            Arc::new(llm),
            Arc::new(video),
            Arc::new(web),
            logs,
        ))
    }

    /// The shared diagnostic log.
    pub fn logs(&self) -> &LogSink {
        &self.logs
    }

    /// The language-model client, for the single-shot wizard operations
    /// that bypass the research pipeline.
    pub fn llm(&self) -> &dyn LanguageModel {
        self.llm.as_ref()
    }

    /// Run the full pipeline for a single product.
    #[instrument(skip(self, features), fields(product = %product.name))]
    pub async fn research_product(
        &self,
        product: &Product,
        features: &FeatureSet,
    ) -> Result<ProductReport, ResearchError> {
        let videos = self.video.search(&product.name).await?;
        if videos.is_empty() {
            return Err(ResearchError::NoVideos {
                product: product.name.clone(),
            });
        }

        let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
        let transcripts = self.video.transcripts(&ids).await?;

        // Keep only videos whose transcript has actual content.
        let mut valid_videos = Vec::new();
        let mut valid_transcripts = Vec::new();
        for video in videos {
            if let Some(text) = transcripts.get(&video.id)
                && !text.trim().is_empty()
            {
                valid_videos.push(video);
                valid_transcripts.push(text.clone());
            }
        }
        if valid_videos.is_empty() {
            return Err(ResearchError::NoTranscripts {
                product: product.name.clone(),
            });
        }

        let analysis = self
            .llm
            .analyze_videos(&product.name, features, &valid_transcripts)
            .await?;

        let website_summary = self
            .web
            .summarize(
                &website_query(&product.name, features),
                SearchFocus::ExcludeForums,
            )
            .await?;

        let forum_summary = self
            .web
            .summarize(
                &forum_query(&product.name, features),
                SearchFocus::ForumsOnly,
            )
            .await?;

        let report = self
            .llm
            .final_report(
                &product.name,
                features,
                &analysis,
                &website_summary,
                &forum_summary,
            )
            .await?;

        info!(videos = valid_videos.len(), "product research complete");

        // The analysis covers the whole batch; attach it to each video.
        for video in &mut valid_videos {
            video.analysis = analysis.clone();
        }

        Ok(ProductReport {
            product_name: product.name.clone(),
            video_results: valid_videos,
            website_summary,
            forum_summary,
            report,
        })
    }

    /// Research a single product, normalizing failures for display.
    pub async fn run_single(
        &self,
        product_name: &str,
        features: &FeatureSet,
    ) -> Result<ResearchResults, ResearchFailure> {
        let product = Product::new(product_name);
        match self.research_product(&product, features).await {
            Ok(report) => Ok(ResearchResults {
                reports: vec![report],
            }),
            Err(e) => Err(ResearchFailure::new(e.to_string(), self.logs.snapshot())),
        }
    }

    /// Research several products in parallel.
    ///
    /// The reserved "Features" pseudo-product is skipped. All products
    /// must succeed; the first failure aborts the batch and carries the
    /// accumulated diagnostic log.
    pub async fn run(
        &self,
        products: &[Product],
        features: &FeatureSet,
    ) -> Result<ResearchResults, ResearchFailure> {
        let targets: Vec<&Product> = products
            .iter()
            .filter(|p| p.name != FEATURES_SENTINEL)
            .collect();

        let tasks = targets
            .into_iter()
            .map(|product| self.research_product(product, features));

        match try_join_all(tasks).await {
            Ok(reports) => Ok(ResearchResults { reports }),
            Err(e) => Err(ResearchFailure::new(e.to_string(), self.logs.snapshot())),
        }
    }
}

/// Build the general-web query for a product.
fn website_query(product: &str, features: &FeatureSet) -> String {
    format!(
        "I'm researching {product}. Provide detailed information about:\n{}\
         Also list any notable limitations or complaints about {product}.",
        feature_lines(features),
    )
}

/// Build the forum-focused query for a product.
fn forum_query(product: &str, features: &FeatureSet) -> String {
    format!(
        "What do users say about {product}? Focus on:\n{}\
         Include common complaints and limitations mentioned by users.",
        feature_lines(features),
    )
}

/// Feature weighting lines for web queries; empty tiers are omitted.
fn feature_lines(features: &FeatureSet) -> String {
    let mut lines = String::new();
    if !features.very_important.is_empty() {
        lines.push_str(&format!(
            "Very important features: {}\n",
            features.very_important.join(", ")
        ));
    }
    if !features.important.is_empty() {
        lines.push_str(&format!(
            "Important features: {}\n",
            features.important.join(", ")
        ));
    }
    lines
}
