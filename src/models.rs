use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence tier assigned to a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStatus {
    Confident,
    Uncertain,
    NoMatch,
}

impl ClassificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confident => "confident",
            Self::Uncertain => "uncertain",
            Self::NoMatch => "no_match",
        }
    }

    /// Human-readable hint attached to non-confident responses.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Confident => None,
            Self::Uncertain => Some("Low confidence match - building might be nearby"),
            Self::NoMatch => Some("No similar buildings found in database"),
        }
    }
}

/// One of the top-K catalog entries, as reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSummary {
    pub building_id: String,
    pub similarity: f32,
    /// Reference image the entry was computed from (provenance only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

/// Outcome of classifying one query embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub status: ClassificationStatus,
    pub building_id: Option<String>,
    /// Winner's highest contributing score, or the best raw score for `no_match`
    pub confidence: f32,
    /// Top-K entries in rank order, regardless of tier
    pub matches: Vec<MatchSummary>,
}

/// Identify request
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyRequest {
    pub embedding: Vec<f32>,
}

/// Identify response: the classification plus a hint for non-confident tiers
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyResponse {
    #[serde(flatten)]
    pub result: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ClassificationResult> for IdentifyResponse {
    fn from(result: ClassificationResult) -> Self {
        let message = result.status.message().map(str::to_string);
        Self { result, message }
    }
}

/// Catalog reload request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReloadRequest {
    /// Snapshot version to load; the configured version when omitted
    pub version: Option<String>,
}

/// Summary of the active catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub version: String,
    pub model: String,
    pub size: usize,
    pub dimension: usize,
    pub building_count: usize,
    pub loaded_at: DateTime<Utc>,
}
