//! `has_tests` / `has_tests_batch` (spec.md §4.10).

use crate::error::CoverageError;
use crate::patterns::test_file_globs;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use rayon::prelude::*;
use regex::Regex;
use sg_core::Language;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The project's test files, enumerated and read once, so per-file lookups
/// don't re-walk the tree (spec.md §4.10 "precomputes the test-file set
/// once").
pub struct TestFileSet {
    /// path -> file content
    files: HashMap<PathBuf, String>,
}

impl TestFileSet {
    pub fn build(root: &Path, language: Language) -> Result<Self, CoverageError> {
        let mut builder = OverrideBuilder::new(root);
        for glob in test_file_globs(language) {
            builder
                .add(glob)
                .map_err(|e| CoverageError::GlobFailed {
                    root: root.display().to_string(),
                    source: e.to_string(),
                })?;
        }
        let overrides = builder.build().map_err(|e| CoverageError::GlobFailed {
            root: root.display().to_string(),
            source: e.to_string(),
        })?;

        let walker = WalkBuilder::new(root).overrides(overrides).build();
        let mut files = HashMap::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path().to_path_buf();
            if let Ok(content) = std::fs::read_to_string(&path) {
                files.insert(path, content);
            }
        }

        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn module_stem(file: &Path) -> String {
    file.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn reference_regex(stem: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(stem))).expect("escaped stem is a valid regex")
}

/// Go ties a source file to its test by filename convention, not by import:
/// `foo.go` is covered by a same-directory `foo_test.go` regardless of
/// whether that file's content mentions `foo` (it usually does, via the
/// `package` clause and direct calls, but the convention itself is
/// sufficient).
fn go_same_directory_test_exists(file: &Path) -> bool {
    let Some(dir) = file.parent() else {
        return false;
    };
    let stem = module_stem(file);
    dir.join(format!("{stem}_test.go")).is_file()
}

/// True iff some test file in `test_files` textually references `file`.
pub fn has_tests(file: &Path, language: Language, test_files: &TestFileSet) -> bool {
    if language == Language::Go && go_same_directory_test_exists(file) {
        return true;
    }
    let stem = module_stem(file);
    if stem.is_empty() {
        return false;
    }
    let pattern = reference_regex(&stem);
    test_files.files.values().any(|content| pattern.is_match(content))
}

/// Batched coverage lookup: the test-file set is computed once, then each
/// input file is checked against it, optionally in parallel
/// (spec.md §4.10 "materially faster than calling the scalar version per
/// file").
pub fn has_tests_batch(
    files: &[PathBuf],
    language: Language,
    root: &Path,
    parallel: bool,
    workers: usize,
) -> Result<Vec<(PathBuf, bool)>, CoverageError> {
    let test_files = TestFileSet::build(root, language)?;

    let compute = |file: &PathBuf| (file.clone(), has_tests(file, language, &test_files));

    if parallel && workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| CoverageError::GlobFailed {
                root: root.display().to_string(),
                source: e.to_string(),
            })?;
        Ok(pool.install(|| files.par_iter().map(compute).collect()))
    } else {
        Ok(files.iter().map(compute).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn file_referenced_by_test_is_covered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("widget.py"), "def build():\n    pass\n").unwrap();
        fs::write(
            dir.path().join("test_widget.py"),
            "import widget\n\ndef test_build():\n    widget.build()\n",
        )
        .unwrap();

        let test_files = TestFileSet::build(dir.path(), Language::Python).unwrap();
        assert_eq!(test_files.len(), 1);
        assert!(has_tests(&dir.path().join("widget.py"), Language::Python, &test_files));
    }

    #[test]
    fn unreferenced_file_is_not_covered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("orphan.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("test_other.py"), "def test_other():\n    pass\n").unwrap();

        let test_files = TestFileSet::build(dir.path(), Language::Python).unwrap();
        assert!(!has_tests(&dir.path().join("orphan.py"), Language::Python, &test_files));
    }

    #[test]
    fn go_same_directory_convention_counts_as_covered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("server.go"), "package main\n").unwrap();
        fs::write(dir.path().join("server_test.go"), "package main\n").unwrap();

        let test_files = TestFileSet::build(dir.path(), Language::Go).unwrap();
        assert!(has_tests(&dir.path().join("server.go"), Language::Go, &test_files));
    }

    #[test]
    fn batch_lookup_matches_scalar_results() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("b.py"), "y = 2\n").unwrap();
        fs::write(dir.path().join("test_a.py"), "import a\n").unwrap();

        let files = vec![dir.path().join("a.py"), dir.path().join("b.py")];
        let results = has_tests_batch(&files, Language::Python, dir.path(), false, 1).unwrap();
        let a_result = results.iter().find(|(p, _)| p.ends_with("a.py")).unwrap();
        let b_result = results.iter().find(|(p, _)| p.ends_with("b.py")).unwrap();
        assert!(a_result.1);
        assert!(!b_result.1);
    }
}
