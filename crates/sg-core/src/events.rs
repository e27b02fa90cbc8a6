//! Structured observability events (spec.md §6).
//!
//! Every tool invocation emits a start, completion, and (on error) an error
//! event shaped `{tool, duration_ms, status, counters}`. We emit these as
//! `tracing` events so the ambient log transport (owned by the collaborator
//! layer, spec.md §1) can route them however it likes; the core only
//! guarantees the shape.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Tracks one invocation's timing and counters, emitting the start event on
/// construction and the completion event on `finish`/`fail`.
pub struct EventScope {
    tool: String,
    started_at: Instant,
    counters: BTreeMap<String, i64>,
}

impl EventScope {
    pub fn start(tool: impl Into<String>) -> Self {
        let tool = tool.into();
        info!(tool = %tool, status = "started", "tool invocation started");
        Self {
            tool,
            started_at: Instant::now(),
            counters: BTreeMap::new(),
        }
    }

    pub fn set_counter(&mut self, name: &str, value: i64) {
        self.counters.insert(name.to_string(), value);
    }

    fn counters_json(&self) -> Value {
        Value::Object(
            self.counters
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect(),
        )
    }

    pub fn finish(self) -> Value {
        let duration_ms = self.started_at.elapsed().as_millis() as u64;
        let event = json!({
            "tool": self.tool,
            "duration_ms": duration_ms,
            "status": "completed",
            "counters": self.counters_json(),
        });
        info!(tool = %self.tool, duration_ms, status = "completed", "tool invocation completed");
        event
    }

    pub fn fail(self, error_kind: &str) -> Value {
        let duration_ms = self.started_at.elapsed().as_millis() as u64;
        let event = json!({
            "tool": self.tool,
            "duration_ms": duration_ms,
            "status": "error",
            "error_kind": error_kind,
            "counters": self.counters_json(),
        });
        tracing::warn!(tool = %self.tool, duration_ms, status = "error", error_kind, "tool invocation failed");
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reports_counters() {
        let mut scope = EventScope::start("find_code");
        scope.set_counter("matches", 3);
        let event = scope.finish();
        assert_eq!(event["tool"], "find_code");
        assert_eq!(event["status"], "completed");
        assert_eq!(event["counters"]["matches"], 3);
    }

    #[test]
    fn fail_reports_error_kind() {
        let scope = EventScope::start("rename_symbol");
        let event = scope.fail("conflict_detected");
        assert_eq!(event["status"], "error");
        assert_eq!(event["error_kind"], "conflict_detected");
    }
}
