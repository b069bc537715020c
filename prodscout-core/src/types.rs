//! Core type definitions for Prodscout.
//!
//! Flat records describing products, their weighted features, and the
//! artifacts a research run produces. Everything here is serde-derived
//! and lives only for the duration of a run.

use serde::{Deserialize, Serialize};

/// How much a feature matters to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Importance {
    #[serde(rename = "Not important")]
    NotImportant,
    #[serde(rename = "Important")]
    Important,
    #[serde(rename = "Very Important")]
    VeryImportant,
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Importance::NotImportant => write!(f, "Not important"),
            Importance::Important => write!(f, "Important"),
            Importance::VeryImportant => write!(f, "Very Important"),
        }
    }
}

/// A single named, weighted product feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub importance: Importance,
}

/// A product under research.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
        }
    }
}

/// Feature names flattened by weight, the form prompts consume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    pub very_important: Vec<String>,
    pub important: Vec<String>,
}

impl FeatureSet {
    /// Split a feature list by importance, dropping `NotImportant` entries.
    pub fn from_features(features: &[Feature]) -> Self {
        let mut set = Self::default();
        for feature in features {
            match feature.importance {
                Importance::VeryImportant => set.very_important.push(feature.name.clone()),
                Importance::Important => set.important.push(feature.name.clone()),
                Importance::NotImportant => {}
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.very_important.is_empty() && self.important.is_empty()
    }
}

/// A review video discovered during research.
///
/// `analysis` stays empty until the language model has processed the
/// video's transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResult {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub analysis: String,
}

/// The aggregated research output for one product.
///
/// `report` holds the raw JSON text of the structured [`FinalReport`];
/// it is validated on receipt but kept verbatim for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReport {
    pub product_name: String,
    pub video_results: Vec<VideoResult>,
    pub website_summary: String,
    pub forum_summary: String,
    pub report: String,
}

/// Per-feature analysis inside the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAnalysis {
    pub name: String,
    pub importance: String,
    pub analysis: String,
}

/// The structured report the language model must emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub introduction: String,
    pub features: Vec<FeatureAnalysis>,
    pub limitations: Vec<String>,
    pub conclusion: String,
}

/// The result of a full research run, one report per product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResults {
    pub reports: Vec<ProductReport>,
}

/// A key/value consideration attached to a product answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConsideration {
    pub key: String,
    pub value: String,
}

/// Overview of a single known product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub product_name: String,
    pub considerations: Vec<ProductConsideration>,
}

/// An alternative product with its considerations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAlternative {
    pub name: String,
    pub considerations: Vec<ProductConsideration>,
}

/// A product compared against its closest alternatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductComparison {
    pub main_product: String,
    pub alternatives: Vec<ProductAlternative>,
}

/// Products suggested from a free-form description of needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecommendations {
    pub recommendations: Vec<ProductAlternative>,
}
