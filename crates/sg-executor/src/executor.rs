//! The subprocess execution engine (non-streaming and line-streaming).

use crate::error::ExecutorError;
use sg_core::{CancelToken, Language};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// How long a streaming child process is given to exit gracefully after a
/// stop signal before it is forcibly killed.
const STOP_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Fraction of malformed lines past which a streamed scan is treated as a
/// failure rather than a best-effort partial result.
const MAX_MALFORMED_LINE_FRACTION: f64 = 0.5;

/// The result of a non-streaming `run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the external matcher and returns structural results.
///
/// Every method takes the matcher binary path explicitly rather than reading
/// it from ambient state (spec.md §9's "explicit `Runtime` value" note):
/// callers build this once from `Runtime::config.matcher_binary`.
pub struct Executor {
    matcher_binary: String,
    matcher_config_path: Option<PathBuf>,
}

impl Executor {
    pub fn new(matcher_binary: impl Into<String>, matcher_config_path: Option<PathBuf>) -> Self {
        Self {
            matcher_binary: matcher_binary.into(),
            matcher_config_path,
        }
    }

    fn build_command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.matcher_binary);
        command.args(args);
        if let Some(config_path) = &self.matcher_config_path {
            command.arg("--config").arg(config_path);
        }
        // The vendor distribution may ship as a wrapper script on Windows;
        // route through the shell there so `.cmd`/`.ps1` shims resolve.
        #[cfg(windows)]
        {
            command.creation_flags(0x0800_0000); // CREATE_NO_WINDOW
        }
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command
    }

    /// Synchronous (non-streaming) invocation: the matcher buffers its full
    /// output and exits.
    pub async fn run(
        &self,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<RunOutput, ExecutorError> {
        let mut command = self.build_command(args);
        if stdin.is_some() {
            command.stdin(Stdio::piped());
        }

        let mut child = command
            .spawn()
            .map_err(|e| ExecutorError::MatcherMissing(self.matcher_binary.clone(), e))?;

        if let Some(bytes) = stdin {
            use tokio::io::AsyncWriteExt;
            if let Some(mut stdin_pipe) = child.stdin.take() {
                stdin_pipe.write_all(bytes).await?;
            }
        }

        let output = child.wait_with_output().await?;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ExecutorError::MatcherFailed {
                status: exit_code,
                stderr,
            });
        }

        Ok(RunOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    /// Streaming invocation: one serialized match JSON document per line.
    /// `on_match` is called with each raw JSON line; return `false` to stop
    /// early. Returns the number of matches delivered.
    pub async fn stream<F>(
        &self,
        args: &[String],
        max_results: Option<usize>,
        mut on_match: F,
        cancel_token: &CancelToken,
    ) -> Result<usize, ExecutorError>
    where
        F: FnMut(&str) -> bool,
    {
        let command = self.build_command(args);
        let mut child = command
            .spawn()
            .map_err(|e| ExecutorError::MatcherMissing(self.matcher_binary.clone(), e))?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let mut lines = BufReader::new(stdout).lines();

        let mut match_count = 0usize;
        let mut malformed = 0usize;
        let mut total = 0usize;
        let mut stopped_early = false;

        loop {
            if cancel_token.is_cancelled() {
                stopped_early = true;
                break;
            }
            if let Some(max) = max_results {
                if match_count >= max {
                    stopped_early = true;
                    break;
                }
            }

            let next_line = match lines.next_line().await {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "error reading matcher stdout");
                    break;
                }
            };

            let line = match next_line {
                Some(line) => line,
                None => break,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            total += 1;
            if serde_json::from_str::<serde_json::Value>(trimmed).is_err() {
                malformed += 1;
                debug!("skipping malformed matcher output line");
                continue;
            }

            match_count += 1;
            if !on_match(trimmed) {
                stopped_early = true;
                break;
            }
        }

        if stopped_early {
            self.stop_gracefully(&mut child).await;
        } else {
            // Drain any remaining output so the child is not left with a full
            // pipe buffer, then wait for natural exit.
            let mut remainder = String::new();
            let _ = lines.get_mut().read_to_string(&mut remainder).await;
            let _ = child.wait().await;
        }

        if total > 0 && (malformed as f64 / total as f64) > MAX_MALFORMED_LINE_FRACTION {
            return Err(ExecutorError::MatcherFailed {
                status: -1,
                stderr: format!("{malformed}/{total} matcher output lines were malformed"),
            });
        }

        Ok(match_count)
    }

    async fn stop_gracefully(&self, child: &mut tokio::process::Child) {
        #[cfg(unix)]
        {
            if let Some(pid) = child.id() {
                // SIGTERM via `kill` is the simplest portable stop signal
                // available without a dedicated signal crate.
                let _ = Command::new("kill")
                    .arg("-TERM")
                    .arg(pid.to_string())
                    .status()
                    .await;
            }
        }

        if timeout(STOP_GRACE_PERIOD, child.wait()).await.is_err() {
            let _ = child.kill().await;
            let _ = child.wait().await;
        }

        if let Some(mut stdout) = child.stdout.take() {
            let mut sink = Vec::new();
            let _ = stdout.read_to_end(&mut sink).await;
        }
        if let Some(mut stderr) = child.stderr.take() {
            let mut sink = Vec::new();
            let _ = stderr.read_to_end(&mut sink).await;
        }
    }

    /// Enumerates source files under `roots` matching `language`'s extension
    /// set, skipping files larger than `max_file_size` and those matching
    /// `exclude_globs`. Used to prune roots before invoking the matcher.
    pub fn filter_paths(
        &self,
        roots: &[PathBuf],
        language: Language,
        max_file_size: Option<u64>,
        exclude_globs: &[String],
    ) -> Result<Vec<PathBuf>, ExecutorError> {
        let mut overrides = ignore::overrides::OverrideBuilder::new(".");
        for glob in exclude_globs {
            // `ignore::overrides` treats a bare pattern as an include; negate
            // it to express "exclude this glob".
            let negated = format!("!{glob}");
            overrides
                .add(&negated)
                .map_err(|e| ExecutorError::Io(std::io::Error::other(e.to_string())))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| ExecutorError::Io(std::io::Error::other(e.to_string())))?;

        let extensions = language.extensions();
        let mut results = Vec::new();

        for root in roots {
            let walker = ignore::WalkBuilder::new(root).overrides(overrides.clone()).build();
            for entry in walker {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(error = %e, "error walking directory tree");
                        continue;
                    }
                };
                if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    continue;
                }
                let path = entry.path();
                let has_matching_extension = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.contains(&ext))
                    .unwrap_or(false);
                if !has_matching_extension {
                    continue;
                }
                if let Some(cap) = max_file_size {
                    if let Ok(meta) = std::fs::metadata(path) {
                        if meta.len() > cap {
                            continue;
                        }
                    }
                }
                results.push(path.to_path_buf());
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn filter_paths_respects_extension_and_size_cap() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1").unwrap();
        fs::write(dir.path().join("b.txt"), "not python").unwrap();
        fs::write(dir.path().join("big.py"), "y".repeat(1000)).unwrap();

        let executor = Executor::new("ast-grep", None);
        let results = executor
            .filter_paths(&[dir.path().to_path_buf()], Language::Python, Some(100), &[])
            .unwrap();

        let names: Vec<_> = results
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert!(names.contains(&"a.py"));
        assert!(!names.contains(&"b.txt"));
        assert!(!names.contains(&"big.py"));
    }

    #[test]
    fn filter_paths_respects_exclude_globs() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("vendor/skip.py"), "x = 1").unwrap();
        fs::write(dir.path().join("keep.py"), "x = 1").unwrap();

        let executor = Executor::new("ast-grep", None);
        let results = executor
            .filter_paths(
                &[dir.path().to_path_buf()],
                Language::Python,
                None,
                &["vendor/**".to_string()],
            )
            .unwrap();

        let names: Vec<_> = results
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert!(names.contains(&"keep.py"));
        assert!(!names.contains(&"skip.py"));
    }

    #[tokio::test]
    async fn run_reports_matcher_missing_for_nonexistent_binary() {
        let executor = Executor::new("definitely-not-a-real-binary-xyz", None);
        let result = executor.run(&["--version".to_string()], None).await;
        assert!(matches!(result, Err(ExecutorError::MatcherMissing(_, _))));
    }
}
