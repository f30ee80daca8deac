use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Where the reference snapshot is loaded from
    pub catalog: CatalogConfig,
    /// Ranking and voting parameters
    pub classifier: ClassifierConfig,
}

/// Location and shape of the reference embedding snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Snapshot root directory (holds `embeddings/` and `metadata/`)
    pub root: PathBuf,
    /// Snapshot version, or "latest" to follow the version manifest
    pub version: String,
    /// Embedding model name; selects the sub-directory inside a version
    pub model: String,
    /// Embedding vector dimension
    pub embedding_dim: usize,
}

/// Parameters of the ranking & voting classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of nearest catalog entries considered per query
    pub top_k: usize,
    /// Similarity at or above which a match counts as confident
    pub confidence_threshold: f32,
    /// Similarity below which an entry gets no vote at all
    pub backup_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            catalog: CatalogConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            version: "latest".to_string(),
            model: "multimodalembedding@001".to_string(),
            embedding_dim: 512,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            confidence_threshold: 0.7,
            backup_threshold: 0.4,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::ZeroValue { field: "top_k" });
        }
        for (field, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("backup_threshold", self.backup_threshold),
        ] {
            if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { field, value });
            }
        }
        if self.backup_threshold > self.confidence_threshold {
            return Err(ConfigError::InvertedThresholds {
                backup: self.backup_threshold,
                confidence: self.confidence_threshold,
            });
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("LANDMARK_BIND_ADDR") {
            config.bind_addr = addr;
        }

        // Catalog snapshot
        if let Ok(root) = std::env::var("CATALOG_ROOT") {
            config.catalog.root = PathBuf::from(root);
        }
        if let Ok(version) = std::env::var("CATALOG_VERSION") {
            config.catalog.version = version;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.catalog.model = model;
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIMENSION") {
            if let Ok(d) = dim.parse() {
                config.catalog.embedding_dim = d;
            }
        }

        // Classifier
        if let Ok(val) = std::env::var("TOP_K") {
            if let Ok(v) = val.parse() {
                config.classifier.top_k = v;
            }
        }
        if let Ok(val) = std::env::var("CONFIDENCE_THRESHOLD") {
            if let Ok(v) = val.parse() {
                config.classifier.confidence_threshold = v;
            }
        }
        if let Ok(val) = std::env::var("BACKUP_THRESHOLD") {
            if let Ok(v) = val.parse() {
                config.classifier.backup_threshold = v;
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.embedding_dim == 0 {
            return Err(ConfigError::ZeroValue {
                field: "embedding_dim",
            });
        }
        if self.catalog.version.trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        self.classifier.validate()
    }
}
