//! # Prodscout Core
//!
//! Core library for the Prodscout product-research assistant.
//! Provides the service clients (language model, video search and
//! transcripts, web search), the research orchestrator, configuration,
//! and the diagnostic API log.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod llm;
pub mod research;
pub mod types;
pub mod video;
pub mod websearch;

// Re-export commonly used types at the crate root.
pub use config::{LlmConfig, ScoutConfig, VideoConfig, WebSearchConfig, load_config};
pub use diagnostics::{ApiLog, ApiService, LogSink};
pub use error::{ApiError, ConfigError, ResearchError, ResearchFailure};
pub use llm::{LanguageModel, LlmApi};
pub use research::Researcher;
pub use types::{
    Feature, FeatureAnalysis, FeatureSet, FinalReport, Importance, Product, ProductAlternative,
    ProductComparison, ProductConsideration, ProductInfo, ProductRecommendations, ProductReport,
    ResearchResults, VideoResult,
};
pub use video::{VideoApi, VideoSource};
pub use websearch::{SearchFocus, WebSearch, WebSearchApi};
