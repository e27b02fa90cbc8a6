//! Local metrics store (spec.md §6 "Metrics store"): a key-value store
//! keyed by `(project, function-location)` holding historical complexity
//! measurements for trend queries.
//!
//! Neither the teacher nor the rest of the pack carries a dedicated
//! key-value store crate (no sled/rocksdb/sqlite anywhere in the
//! workspace), so this follows the same pattern `sg-backup`'s manifest
//! already uses: a single JSON document, read whole and rewritten whole.

use crate::complexity::FunctionMetrics;
use crate::error::QualityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub project: String,
    pub path: String,
    pub function: String,
    pub cyclomatic: usize,
    pub cognitive: usize,
    pub nesting: usize,
    pub length: usize,
    pub measured_at: DateTime<Utc>,
}

impl MetricsRecord {
    pub fn key(project: &str, path: &str, function: &str) -> String {
        format!("{project}\u{1f}{path}\u{1f}{function}")
    }
}

/// A local store rooted at a single JSON file, one history entry per
/// `(project, path, function)` key. History is append-only; trend queries
/// read the whole series for a key.
pub struct MetricsStore {
    file_path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    history: BTreeMap<String, Vec<MetricsRecord>>,
}

impl MetricsStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    fn load(&self) -> Result<Document, QualityError> {
        if !self.file_path.exists() {
            return Ok(Document::default());
        }
        let text = std::fs::read_to_string(&self.file_path).map_err(|source| {
            QualityError::ReadFailed {
                path: self.file_path.clone(),
                source,
            }
        })?;
        serde_json::from_str(&text).map_err(|e| QualityError::StoreFailed {
            reason: format!("corrupt metrics store at {}: {e}", self.file_path.display()),
        })
    }

    fn save(&self, document: &Document) -> Result<(), QualityError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| QualityError::ReadFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(document).map_err(|e| QualityError::StoreFailed {
            reason: e.to_string(),
        })?;
        std::fs::write(&self.file_path, text).map_err(|source| QualityError::ReadFailed {
            path: self.file_path.clone(),
            source,
        })
    }

    /// Records one measurement, appending to that key's history.
    pub fn record(
        &self,
        project: &str,
        path: &Path,
        function: &str,
        metrics: &FunctionMetrics,
        measured_at: DateTime<Utc>,
    ) -> Result<(), QualityError> {
        let mut document = self.load()?;
        let key = MetricsRecord::key(project, &path.display().to_string(), function);
        document.history.entry(key).or_default().push(MetricsRecord {
            project: project.to_string(),
            path: path.display().to_string(),
            function: function.to_string(),
            cyclomatic: metrics.cyclomatic_complexity,
            cognitive: metrics.cognitive_complexity,
            nesting: metrics.max_nesting_depth,
            length: metrics.line_count,
            measured_at,
        });
        self.save(&document)
    }

    /// The full measurement history for one function, oldest first.
    pub fn history(
        &self,
        project: &str,
        path: &Path,
        function: &str,
    ) -> Result<Vec<MetricsRecord>, QualityError> {
        let document = self.load()?;
        let key = MetricsRecord::key(project, &path.display().to_string(), function);
        Ok(document.history.get(&key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_metrics() -> FunctionMetrics {
        FunctionMetrics {
            cyclomatic_complexity: 3,
            cognitive_complexity: 2,
            max_nesting_depth: 1,
            line_count: 10,
            parameter_count: 2,
        }
    }

    #[test]
    fn records_append_to_the_same_key_history() {
        let dir = tempdir().unwrap();
        let store = MetricsStore::new(dir.path().join("metrics.json"));
        let path = PathBuf::from("a.py");

        store
            .record("proj", &path, "foo", &sample_metrics(), Utc::now())
            .unwrap();
        let mut later = sample_metrics();
        later.cyclomatic_complexity = 5;
        store.record("proj", &path, "foo", &later, Utc::now()).unwrap();

        let history = store.history("proj", &path, "foo").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].cyclomatic, 5);
    }

    #[test]
    fn unknown_key_returns_empty_history() {
        let dir = tempdir().unwrap();
        let store = MetricsStore::new(dir.path().join("metrics.json"));
        let history = store.history("proj", Path::new("missing.py"), "nope").unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn store_survives_reload_from_disk() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("metrics.json");
        {
            let store = MetricsStore::new(&file);
            store
                .record("proj", Path::new("a.py"), "foo", &sample_metrics(), Utc::now())
                .unwrap();
        }
        let reopened = MetricsStore::new(&file);
        let history = reopened.history("proj", Path::new("a.py"), "foo").unwrap();
        assert_eq!(history.len(), 1);
    }
}
