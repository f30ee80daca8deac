//! The reference catalog: every (building, embedding) pair the service can
//! match against, loaded once from a versioned snapshot and never mutated.

pub mod snapshot;

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::{CatalogLoadError, ConfigError};
use snapshot::{SnapshotRecord, SnapshotSource};

/// A single reference embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub building_id: String,
    /// Reference image the embedding came from; not used in scoring
    pub image_id: Option<String>,
    pub embedding: Vec<f32>,
}

/// Immutable in-memory collection of reference embeddings.
///
/// Entries keep their snapshot order, which is what ranking ties fall back on.
#[derive(Debug)]
pub struct Catalog {
    version: String,
    dimension: usize,
    entries: Vec<CatalogEntry>,
    building_count: usize,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// Load the snapshot designated by `version` from `source`.
    ///
    /// `version` may be a concrete version or a pointer such as "latest";
    /// resolving it is up to the source.
    pub fn load(
        source: &dyn SnapshotSource,
        version: &str,
        dimension: usize,
    ) -> Result<Self, CatalogLoadError> {
        check_dimension(dimension)?;
        let resolved = source.resolve_version(version)?;
        let records = source.read_records(&resolved)?;
        tracing::info!(
            "Read {} snapshot records for version {resolved}",
            records.len()
        );

        let mut seen_ids = HashSet::new();
        let mut entries = Vec::with_capacity(records.len());
        for SnapshotRecord {
            line,
            id,
            building_id,
            embedding,
        } in records
        {
            if !seen_ids.insert(id.clone()) {
                return Err(CatalogLoadError::DuplicateId { line, id });
            }
            validate_embedding(line, &embedding, dimension)?;
            entries.push(CatalogEntry {
                building_id,
                image_id: Some(id),
                embedding,
            });
        }

        Self::build(resolved, dimension, entries)
    }

    /// Build a catalog from entries already in memory. Entry positions
    /// (1-based) stand in for line numbers in validation errors.
    pub fn from_entries(
        version: impl Into<String>,
        dimension: usize,
        entries: Vec<CatalogEntry>,
    ) -> Result<Self, CatalogLoadError> {
        check_dimension(dimension)?;
        for (i, entry) in entries.iter().enumerate() {
            validate_embedding(i + 1, &entry.embedding, dimension)?;
        }
        Self::build(version.into(), dimension, entries)
    }

    fn build(
        version: String,
        dimension: usize,
        entries: Vec<CatalogEntry>,
    ) -> Result<Self, CatalogLoadError> {
        if entries.is_empty() {
            return Err(CatalogLoadError::Empty { version });
        }

        let building_count = entries
            .iter()
            .map(|e| e.building_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        tracing::info!(
            "Catalog {version}: {} embeddings across {building_count} buildings (dim {dimension})",
            entries.len(),
        );

        Ok(Self {
            version,
            dimension,
            entries,
            building_count,
            loaded_at: Utc::now(),
        })
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn building_count(&self) -> usize {
        self.building_count
    }
}

fn check_dimension(dimension: usize) -> Result<(), CatalogLoadError> {
    if dimension == 0 {
        return Err(ConfigError::ZeroValue {
            field: "embedding_dim",
        }
        .into());
    }
    Ok(())
}

fn validate_embedding(
    line: usize,
    embedding: &[f32],
    dimension: usize,
) -> Result<(), CatalogLoadError> {
    if embedding.len() != dimension {
        return Err(CatalogLoadError::DimensionMismatch {
            line,
            got: embedding.len(),
            want: dimension,
        });
    }
    if embedding.iter().any(|x| !x.is_finite()) {
        return Err(CatalogLoadError::InvalidVector {
            line,
            message: "non-finite component".to_string(),
        });
    }
    if embedding.iter().all(|x| *x == 0.0) {
        return Err(CatalogLoadError::InvalidVector {
            line,
            message: "zero-magnitude embedding".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Vec<SnapshotRecord>);

    impl SnapshotSource for FixedSource {
        fn resolve_version(&self, requested: &str) -> Result<String, CatalogLoadError> {
            Ok(if requested == "latest" {
                "v2".to_string()
            } else {
                requested.to_string()
            })
        }

        fn read_records(&self, _version: &str) -> Result<Vec<SnapshotRecord>, CatalogLoadError> {
            Ok(self.0.clone())
        }
    }

    fn record(line: usize, id: &str, embedding: Vec<f32>) -> SnapshotRecord {
        SnapshotRecord {
            line,
            id: id.to_string(),
            building_id: id.split('_').next().unwrap().to_string(),
            embedding,
        }
    }

    fn entry(building: &str, embedding: Vec<f32>) -> CatalogEntry {
        CatalogEntry {
            building_id: building.to_string(),
            image_id: None,
            embedding,
        }
    }

    #[test]
    fn test_load_resolves_version_and_keeps_order() {
        let source = FixedSource(vec![
            record(1, "7_aaa", vec![1.0, 0.0]),
            record(2, "3_bbb", vec![0.0, 1.0]),
            record(3, "7_ccc", vec![0.5, 0.5]),
        ]);
        let catalog = Catalog::load(&source, "latest", 2).unwrap();
        assert_eq!(catalog.version(), "v2");
        assert_eq!(catalog.size(), 3);
        assert_eq!(catalog.dimension(), 2);
        assert_eq!(catalog.building_count(), 2);
        assert_eq!(catalog.entries()[2].image_id.as_deref(), Some("7_ccc"));
    }

    #[test]
    fn test_load_rejects_empty_snapshot() {
        let err = Catalog::load(&FixedSource(vec![]), "v1", 2).unwrap_err();
        assert!(matches!(err, CatalogLoadError::Empty { .. }));
    }

    #[test]
    fn test_load_rejects_wrong_dimension_with_line() {
        let source = FixedSource(vec![
            record(1, "1_a", vec![1.0, 0.0]),
            record(4, "1_b", vec![1.0, 0.0, 0.0]),
        ]);
        match Catalog::load(&source, "v1", 2).unwrap_err() {
            CatalogLoadError::DimensionMismatch { line, got, want } => {
                assert_eq!((line, got, want), (4, 3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let source = FixedSource(vec![
            record(1, "1_a", vec![1.0, 0.0]),
            record(2, "1_a", vec![0.0, 1.0]),
        ]);
        let err = Catalog::load(&source, "v1", 2).unwrap_err();
        assert!(matches!(err, CatalogLoadError::DuplicateId { line: 2, .. }));
    }

    #[test]
    fn test_zero_and_non_finite_embeddings_rejected() {
        let err = Catalog::from_entries("v1", 2, vec![entry("a", vec![0.0, 0.0])]).unwrap_err();
        assert!(matches!(err, CatalogLoadError::InvalidVector { line: 1, .. }));

        let err = Catalog::from_entries(
            "v1",
            2,
            vec![entry("a", vec![1.0, 0.0]), entry("b", vec![f32::NAN, 1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogLoadError::InvalidVector { line: 2, .. }));
    }

    #[test]
    fn test_zero_dimension_is_config_error() {
        let err = Catalog::from_entries("v1", 0, vec![entry("a", vec![])]).unwrap_err();
        assert!(matches!(
            err,
            CatalogLoadError::Config(ConfigError::ZeroValue {
                field: "embedding_dim"
            })
        ));
    }
}
