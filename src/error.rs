use thiserror::Error;

/// Failure to build a [`Catalog`](crate::catalog::Catalog) from a snapshot.
///
/// Always fatal at startup: the service must not serve traffic with a missing
/// or partial catalog. During a reload the previously active catalog is kept.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("catalog: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog: malformed record at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("catalog: snapshot {version} contains no embeddings")]
    Empty { version: String },

    #[error("catalog: dimension mismatch at line {line}: got {got}, want {want}")]
    DimensionMismatch { line: usize, got: usize, want: usize },

    #[error("catalog: invalid vector at line {line}: {message}")]
    InvalidVector { line: usize, message: String },

    #[error("catalog: duplicate record id {id:?} at line {line}")]
    DuplicateId { line: usize, id: String },

    #[error("catalog: version not found: {0}")]
    VersionNotFound(String),

    #[error("catalog: {0}")]
    Config(#[from] ConfigError),
}

/// Rejected service or classifier settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {field} must be at least 1")]
    ZeroValue { field: &'static str },

    #[error("invalid configuration: {field} must be within [-1, 1], got {value}")]
    ThresholdOutOfRange { field: &'static str, value: f32 },

    #[error(
        "invalid configuration: backup_threshold ({backup}) must not exceed confidence_threshold ({confidence})"
    )]
    InvertedThresholds { backup: f32, confidence: f32 },

    #[error("invalid configuration: catalog version must not be empty")]
    EmptyVersion,
}

/// Per-request failure. Reported to the caller as a client error; never
/// touches catalog or classifier state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentifyError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid vector: {0}")]
    InvalidVector(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message_names_both_sizes() {
        let err = IdentifyError::DimensionMismatch {
            expected: 512,
            got: 3,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 512, got 3");
    }

    #[test]
    fn test_catalog_error_carries_line_number() {
        let err = CatalogLoadError::Malformed {
            line: 7,
            message: "expected value".to_string(),
        };
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = CatalogLoadError::Io {
            path: "metadata/versions.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let source = std::error::Error::source(&err).expect("io error is the source");
        assert_eq!(source.to_string(), "no such file");
        assert!(err.to_string().contains("metadata/versions.json"));
    }

    #[test]
    fn test_config_error_converts_into_catalog_error() {
        let err: CatalogLoadError = ConfigError::ZeroValue {
            field: "embedding_dim",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "catalog: invalid configuration: embedding_dim must be at least 1"
        );
    }
}
