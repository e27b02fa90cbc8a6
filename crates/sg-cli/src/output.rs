//! Presentation helpers, grounded on the teacher's `output.rs`: small static
//! functions turning a result `Value` into terminal text, kept separate from
//! command dispatch so formatting can change without touching control flow.

use colored::Colorize;
use serde_json::Value;

pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("{}", format!("failed to render JSON: {e}").red()),
    }
}

pub fn print_matches(value: &Value) {
    let matches = value.get("matches").and_then(Value::as_array).cloned().unwrap_or_default();
    if matches.is_empty() {
        println!("{}", "no matches".dimmed());
        return;
    }
    for m in &matches {
        let path = m.get("path").and_then(Value::as_str).unwrap_or("?");
        let line = m.get("start_line").and_then(Value::as_u64).unwrap_or(0);
        let text = m.get("text").and_then(Value::as_str).unwrap_or("");
        println!("{}:{} {}", path.cyan(), line.to_string().yellow(), text.trim());
    }
    let from_cache = value.get("from_cache").and_then(Value::as_bool).unwrap_or(false);
    println!(
        "{}",
        format!("{} match(es){}", matches.len(), if from_cache { " (cache hit)" } else { "" }).dimmed()
    );
}

pub fn print_rewrite_outcome(value: &Value) {
    match value.get("status").and_then(Value::as_str) {
        Some("applied") => {
            let backup_id = value.get("backup_id").and_then(Value::as_str).unwrap_or("?");
            println!("{} (backup {})", "applied".green().bold(), backup_id);
            if let Some(paths) = value.get("applied_paths").and_then(Value::as_array) {
                for p in paths {
                    if let Some(s) = p.as_str() {
                        println!("  {}", s);
                    }
                }
            }
        }
        Some("preview") => {
            println!("{}", "preview (dry run, nothing written)".yellow());
            if let Some(diffs) = value.get("diffs").and_then(Value::as_array) {
                for diff in diffs {
                    if let Some(text) = diff.get("unified_diff").and_then(Value::as_str) {
                        println!("{text}");
                    }
                }
            }
        }
        Some("conflict") => {
            println!("{}", "conflict, nothing written".red().bold());
            if let Some(conflicts) = value.get("conflicts").and_then(Value::as_array) {
                for c in conflicts {
                    if let Some(s) = c.as_str() {
                        println!("  {}", s.red());
                    }
                }
            }
        }
        _ => print_json(value),
    }
}

pub fn print_error(debug: bool, err: &anyhow::Error) {
    if debug {
        eprintln!("{}", format!("{err:?}").red());
    } else {
        eprintln!("{} {err}", "Error:".red().bold());
        eprintln!("{}", "run with --debug for the full error chain".dimmed());
    }
}
