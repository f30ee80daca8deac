use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::CatalogLoadError;

/// Version pointer that resolves to the most recently published snapshot.
pub const LATEST: &str = "latest";

/// One embedding record read from a snapshot, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    /// 1-based line in the snapshot file
    pub line: usize,
    /// Reference image id, e.g. "42_9f8e7d"
    pub id: String,
    pub building_id: String,
    pub embedding: Vec<f32>,
}

/// Where versioned embedding snapshots come from.
///
/// Implementations own version resolution; the catalog only ever sees a
/// concrete version string and the records behind it.
pub trait SnapshotSource: Send + Sync {
    /// Turn a requested version (possibly a pointer like [`LATEST`]) into a
    /// concrete one.
    fn resolve_version(&self, requested: &str) -> Result<String, CatalogLoadError>;

    /// Read every record of a concrete version, in snapshot order.
    fn read_records(&self, version: &str) -> Result<Vec<SnapshotRecord>, CatalogLoadError>;
}

/// Snapshots published to a local directory tree:
///
/// ```text
/// <root>/embeddings/<version>/<model>/embeddings.jsonl
/// <root>/metadata/versions.json
/// ```
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    root: PathBuf,
    model: String,
}

#[derive(Deserialize)]
struct VersionManifest {
    #[serde(default)]
    versions: Vec<VersionEntry>,
}

#[derive(Deserialize)]
struct VersionEntry {
    version: String,
}

#[derive(Deserialize)]
struct RawRecord {
    id: String,
    embedding: Vec<f32>,
    #[serde(default)]
    building_id: Option<serde_json::Value>,
}

impl LocalSnapshotStore {
    pub fn new(root: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            model: model.into(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("metadata").join("versions.json")
    }

    pub fn snapshot_path(&self, version: &str) -> PathBuf {
        self.root
            .join("embeddings")
            .join(version)
            .join(&self.model)
            .join("embeddings.jsonl")
    }

    /// All published versions, oldest first.
    pub fn list_versions(&self) -> Result<Vec<String>, CatalogLoadError> {
        let data = read_file(&self.manifest_path())?;
        let manifest: VersionManifest =
            serde_json::from_str(&data).map_err(|e| CatalogLoadError::Malformed {
                line: e.line(),
                message: format!("versions.json: {e}"),
            })?;
        Ok(manifest.versions.into_iter().map(|v| v.version).collect())
    }
}

impl SnapshotSource for LocalSnapshotStore {
    fn resolve_version(&self, requested: &str) -> Result<String, CatalogLoadError> {
        let version = if requested == LATEST {
            self.list_versions()?
                .pop()
                .ok_or_else(|| CatalogLoadError::VersionNotFound(LATEST.to_string()))?
        } else {
            requested.to_string()
        };

        // Versions become path components; refuse anything that could escape the root.
        if version.is_empty()
            || version == "."
            || version == ".."
            || version.contains(['/', '\\'])
        {
            return Err(CatalogLoadError::VersionNotFound(version));
        }
        if !self.snapshot_path(&version).is_file() {
            return Err(CatalogLoadError::VersionNotFound(version));
        }
        Ok(version)
    }

    fn read_records(&self, version: &str) -> Result<Vec<SnapshotRecord>, CatalogLoadError> {
        let path = self.snapshot_path(version);
        tracing::info!("Loading embeddings from {}", path.display());
        parse_jsonl(&read_file(&path)?)
    }
}

fn read_file(path: &Path) -> Result<String, CatalogLoadError> {
    std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parse JSONL embedding records. Blank lines are skipped; any bad line
/// fails the whole parse.
pub fn parse_jsonl(data: &str) -> Result<Vec<SnapshotRecord>, CatalogLoadError> {
    let mut records = Vec::new();
    for (i, raw) in data.lines().enumerate() {
        let line = i + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let record: RawRecord =
            serde_json::from_str(raw).map_err(|e| CatalogLoadError::Malformed {
                line,
                message: e.to_string(),
            })?;
        if record.id.trim().is_empty() {
            return Err(CatalogLoadError::Malformed {
                line,
                message: "empty id".to_string(),
            });
        }

        let building_id = match record.building_id {
            None | Some(serde_json::Value::Null) => building_from_image_id(&record.id).to_string(),
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            Some(other) => {
                return Err(CatalogLoadError::Malformed {
                    line,
                    message: format!("building_id must be a string or integer, got {other}"),
                });
            }
        };

        records.push(SnapshotRecord {
            line,
            id: record.id,
            building_id,
            embedding: record.embedding,
        });
    }
    Ok(records)
}

/// Image ids are "<building>_<image hash>"; ids without a separator are
/// their own building.
pub fn building_from_image_id(id: &str) -> &str {
    id.split_once('_').map_or(id, |(building, _)| building)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(root: &Path, version: &str, model: &str, body: &str) {
        let dir = root.join("embeddings").join(version).join(model);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("embeddings.jsonl"), body).unwrap();
    }

    fn write_manifest(root: &Path, versions: &[&str]) {
        let dir = root.join("metadata");
        std::fs::create_dir_all(&dir).unwrap();
        let entries: Vec<_> = versions
            .iter()
            .map(|v| serde_json::json!({ "version": v, "created_at": "2025-10-15T14:30:22" }))
            .collect();
        std::fs::write(
            dir.join("versions.json"),
            serde_json::json!({ "versions": entries }).to_string(),
        )
        .unwrap();
    }

    #[test]
    fn test_building_from_image_id() {
        assert_eq!(building_from_image_id("42_9f8e7d"), "42");
        assert_eq!(building_from_image_id("42_9f_8e"), "42");
        assert_eq!(building_from_image_id("widener"), "widener");
    }

    #[test]
    fn test_parse_jsonl_skips_blank_lines_and_ignores_extra_fields() {
        let data = r#"{"id": "1_aa", "embedding": [1.0, 0.0]}

{"id": "2_bb", "embedding": [0.0, 1.0], "numeric_restricts": [{"namespace": "latitude", "value_double": 42.37}]}
"#;
        let records = parse_jsonl(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].building_id, "1");
        assert_eq!(records[1].line, 3);
        assert_eq!(records[1].building_id, "2");
    }

    #[test]
    fn test_parse_jsonl_explicit_building_id() {
        let data = r#"{"id": "img-1", "building_id": 17, "embedding": [1.0]}
{"id": "img-2", "building_id": "memorial-hall", "embedding": [1.0]}"#;
        let records = parse_jsonl(data).unwrap();
        assert_eq!(records[0].building_id, "17");
        assert_eq!(records[1].building_id, "memorial-hall");
    }

    #[test]
    fn test_parse_jsonl_rejects_fractional_building_id() {
        let data = r#"{"id": "img-1", "building_id": 1.5, "embedding": [1.0]}"#;
        match parse_jsonl(data).unwrap_err() {
            CatalogLoadError::Malformed { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("building_id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_jsonl_reports_bad_line() {
        let data = "{\"id\": \"1_a\", \"embedding\": [1.0]}\n{not json}\n";
        match parse_jsonl(data).unwrap_err() {
            CatalogLoadError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_latest_uses_last_manifest_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSnapshotStore::new(dir.path(), "m");
        write_snapshot(dir.path(), "v1", "m", "{\"id\":\"1_a\",\"embedding\":[1.0]}");
        write_snapshot(dir.path(), "v2", "m", "{\"id\":\"1_a\",\"embedding\":[1.0]}");
        write_manifest(dir.path(), &["v1", "v2"]);

        assert_eq!(store.list_versions().unwrap(), vec!["v1", "v2"]);
        assert_eq!(store.resolve_version(LATEST).unwrap(), "v2");
        assert_eq!(store.resolve_version("v1").unwrap(), "v1");
    }

    #[test]
    fn test_resolve_latest_without_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSnapshotStore::new(dir.path(), "m");
        let err = store.resolve_version(LATEST).unwrap_err();
        match &err {
            CatalogLoadError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(std::error::Error::source(&err).is_some());

        write_manifest(dir.path(), &[]);
        assert!(matches!(
            store.resolve_version(LATEST).unwrap_err(),
            CatalogLoadError::VersionNotFound(_)
        ));
    }

    #[test]
    fn test_resolve_rejects_unknown_and_traversal_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSnapshotStore::new(dir.path(), "m");
        for version in ["v9", "../v1", "..", ""] {
            assert!(
                matches!(
                    store.resolve_version(version).unwrap_err(),
                    CatalogLoadError::VersionNotFound(_)
                ),
                "version {version:?} should not resolve"
            );
        }
    }
}
