//! Snapshot providers
//!
//! SBIO pattern: parsing is pure (`parse_snapshot`), file access lives in
//! `FileSnapshotSource` at the I/O boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::model::ClusterSnapshot;

/// Errors raised while producing a snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(String),

    #[error("{0}")]
    Unavailable(String),
}

/// The single read boundary with the scheduler cache.
///
/// Implementations return a self-consistent point-in-time view. The
/// snapshot is shared read-only; projections never write through it.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> Result<Arc<ClusterSnapshot>, SnapshotError>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for Arc<S> {
    fn snapshot(&self) -> Result<Arc<ClusterSnapshot>, SnapshotError> {
        (**self).snapshot()
    }
}

/// Snapshot encoding on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Pick the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => SnapshotFormat::Yaml,
            _ => SnapshotFormat::Json,
        }
    }
}

// ============================================================================
// SBIO: Pure parsing
// ============================================================================

/// Parse a snapshot document
pub fn parse_snapshot(content: &str, format: SnapshotFormat) -> Result<ClusterSnapshot, SnapshotError> {
    match format {
        SnapshotFormat::Json => {
            serde_json::from_str(content).map_err(|e| SnapshotError::Parse(e.to_string()))
        }
        SnapshotFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| SnapshotError::Parse(e.to_string()))
        }
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Serves one fixed snapshot, shared across calls
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource {
    snapshot: Arc<ClusterSnapshot>,
}

impl StaticSnapshotSource {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }
}

impl SnapshotSource for StaticSnapshotSource {
    fn snapshot(&self) -> Result<Arc<ClusterSnapshot>, SnapshotError> {
        Ok(Arc::clone(&self.snapshot))
    }
}

/// Re-reads a snapshot file on every call, so each projection sees the
/// latest dump written by the scheduler.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
    format: SnapshotFormat,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SnapshotFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn snapshot(&self) -> Result<Arc<ClusterSnapshot>, SnapshotError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SnapshotError::Io(self.path.clone(), e))?;
        let snapshot = parse_snapshot(&content, self.format)?;
        debug!(
            "Loaded snapshot from {}: {} nodes, {} queues, {} jobs",
            self.path.display(),
            snapshot.nodes.len(),
            snapshot.queues.len(),
            snapshot.jobs.len()
        );
        if snapshot.is_empty() {
            warn!(
                "Snapshot {} has no nodes, queues or jobs",
                self.path.display()
            );
        }
        Ok(Arc::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &str, suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SnapshotFormat::from_path(Path::new("dump.yaml")),
            SnapshotFormat::Yaml
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("dump.yml")),
            SnapshotFormat::Yaml
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("dump.json")),
            SnapshotFormat::Json
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("dump")),
            SnapshotFormat::Json
        );
    }

    #[test]
    fn test_parse_yaml_snapshot() {
        let yaml = r#"
queues:
  root:
    name: root
    priority: 100
  root.a:
    name: a
    parent: root
"#;
        let snapshot = parse_snapshot(yaml, SnapshotFormat::Yaml).unwrap();
        assert_eq!(snapshot.queues.len(), 2);
        assert_eq!(snapshot.queues["root.a"].parent, "root");
        assert!(snapshot.nodes.is_empty());
    }

    #[test]
    fn test_parse_invalid_snapshot() {
        let result = parse_snapshot("{not json", SnapshotFormat::Json);
        assert!(matches!(result, Err(SnapshotError::Parse(_))));
    }

    #[test]
    fn test_file_source_reads_json() {
        let file = create_temp_file(
            r#"{"nodes": {"n1": {"name": "n1", "gpuCount": 4}}}"#,
            ".json",
        );
        let source = FileSnapshotSource::new(file.path());
        assert_eq!(source.path(), file.path());
        let snapshot = source.snapshot().unwrap();
        assert_eq!(snapshot.nodes["n1"].gpu_count(), 4);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_file_source_empty_document() {
        let file = create_temp_file("{}", ".json");
        let snapshot = FileSnapshotSource::new(file.path()).snapshot().unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_file_source_missing_file() {
        let source = FileSnapshotSource::new("/nonexistent/snapshot.json");
        assert!(matches!(source.snapshot(), Err(SnapshotError::Io(_, _))));
    }

    #[test]
    fn test_static_source_shares_snapshot() {
        let source = StaticSnapshotSource::new(ClusterSnapshot::new());
        let a = source.snapshot().unwrap();
        let b = source.snapshot().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
