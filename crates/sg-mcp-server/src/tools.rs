//! Concrete tool handlers wiring the structural analysis core into the
//! registry (spec.md §4 contracts, one handler per tool).
//!
//! Each handler emits the `{tool, duration_ms, status, counters}` event
//! spec.md §6 requires, via [`sg_core::EventScope`], and never returns a
//! bare `Result` error to the wire layer — `CoreError` is the common
//! currency, translated to a JSON-RPC error by `protocol::JsonRpcError`.

use crate::registry::{Registry, ToolFuture, ToolHandler};
use crate::runtime::AppContext;
use crate::protocol::ToolInfo;
use serde_json::{json, Value};
use sg_core::{CancelToken, CoreError, ErrorKind, EventScope, Language, MatchRecord, Outcome, QueryFingerprint};
use sg_dedup::{rank_groups, ConstructKind, RankingInputs, SimilarityConfig, SimilarityPipeline};
use sg_refactor::{extract_function, rename_symbol, ExtractFunctionRequest, RenameOutcome, RenameScope};
use sg_rewrite::RewriteEngine;
use std::path::PathBuf;

fn arg_str(args: &Value, key: &str) -> Result<String, CoreError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CoreError::new(ErrorKind::Internal, format!("missing required argument '{key}'")))
}

fn arg_str_opt(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn arg_bool(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn arg_usize(args: &Value, key: &str, default: usize) -> usize {
    args.get(key).and_then(Value::as_u64).map(|v| v as usize).unwrap_or(default)
}

fn arg_paths(args: &Value, key: &str) -> Vec<PathBuf> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(PathBuf::from).collect())
        .unwrap_or_default()
}

fn arg_strings(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn language_arg(args: &Value) -> Result<Language, CoreError> {
    let raw = arg_str(args, "language")?;
    Language::from_name(&raw).ok_or_else(|| CoreError::new(ErrorKind::Internal, format!("unknown language '{raw}'")))
}

fn args_or_missing(arguments: Option<Value>) -> Result<Value, CoreError> {
    arguments.ok_or_else(|| CoreError::new(ErrorKind::Internal, "tool call is missing 'arguments'"))
}

// ---------------------------------------------------------------------
// find_code (C1/C2)
// ---------------------------------------------------------------------

fn find_code_info() -> ToolInfo {
    ToolInfo {
        name: "find_code".to_string(),
        description: "Run a structural pattern or rule query over one or more roots, with caching".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "ast-grep pattern; mutually exclusive with rule_yaml" },
                "rule_yaml": { "type": "string", "description": "full rule document; mutually exclusive with pattern" },
                "language": { "type": "string" },
                "roots": { "type": "array", "items": { "type": "string" } },
                "exclude_globs": { "type": "array", "items": { "type": "string" } },
                "max_file_size": { "type": "integer", "description": "skip files larger than this many bytes" },
                "max_results": { "type": "integer" },
            },
            "required": ["language", "roots"],
        }),
    }
}

fn find_code_handler<'a>(ctx: &'a AppContext, arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("find_code");
        let result = find_code_inner(ctx, arguments).await;
        match result {
            Ok((value, match_count)) => {
                scope.set_counter("matches", match_count as i64);
                let _ = scope.finish();
                Ok(value)
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

async fn find_code_inner(ctx: &AppContext, arguments: Option<Value>) -> Result<(Value, usize), CoreError> {
    let args = args_or_missing(arguments)?;
    let language = language_arg(&args)?;
    let roots = arg_paths(&args, "roots");
    let exclude_globs = arg_strings(&args, "exclude_globs");
    let max_file_size = args.get("max_file_size").and_then(Value::as_u64);
    let max_results = args.get("max_results").and_then(Value::as_u64).map(|v| v as usize);

    let pattern = arg_str_opt(&args, "pattern");
    let rule_yaml = arg_str_opt(&args, "rule_yaml");

    // Prune to the concrete file list up front so `exclude_globs` and
    // `max_file_size` apply identically to both query kinds, instead of
    // only the rule branch threading `--globs` through to the matcher.
    let filtered_paths = ctx
        .executor
        .filter_paths(&roots, language, max_file_size, &exclude_globs)
        .map_err(CoreError::from)?;

    let (command, pattern_or_rule, matcher_args) = match (&pattern, &rule_yaml) {
        (Some(pattern), None) => {
            let mut matcher_args = vec!["run".to_string(), "--pattern".to_string(), pattern.clone(), "--json=stream".to_string(), "--lang".to_string(), language.name().to_string()];
            for path in &filtered_paths {
                matcher_args.push(path.display().to_string());
            }
            (sg_core::CommandKind::Find, pattern.clone(), matcher_args)
        }
        (None, Some(rule_yaml)) => {
            let rule = sg_core::RuleDocument::parse(rule_yaml)?;
            let mut matcher_args = vec!["scan".to_string(), "--json=stream".to_string()];
            for path in &filtered_paths {
                matcher_args.push(path.display().to_string());
            }
            (sg_core::CommandKind::FindByRule, rule.header.id.clone(), matcher_args)
        }
        _ => {
            return Err(CoreError::new(
                ErrorKind::Internal,
                "exactly one of 'pattern' or 'rule_yaml' must be supplied",
            ))
        }
    };

    let fingerprint = QueryFingerprint::new(
        command,
        pattern_or_rule,
        language.name(),
        roots.clone(),
        max_file_size,
        exclude_globs.clone(),
    );
    let cache_key = fingerprint.cache_key();

    if ctx.runtime.config.cache_enabled {
        if let Some(cached) = ctx.cache.get(&cache_key) {
            let count = cached.len();
            return Ok((json!({ "matches": cached, "from_cache": true }), count));
        }
    }

    if filtered_paths.is_empty() {
        if ctx.runtime.config.cache_enabled {
            ctx.cache.put(cache_key, Vec::new());
        }
        return Ok((json!({ "matches": [], "from_cache": false }), 0));
    }

    let cancel_token = CancelToken::new();
    let mut matches: Vec<MatchRecord> = Vec::new();
    ctx.executor
        .stream(
            &matcher_args,
            max_results,
            |line| {
                if let Ok(wire) = serde_json::from_str::<sg_core::WireMatch>(line) {
                    matches.push(wire.into());
                }
                true
            },
            &cancel_token,
        )
        .await
        .map_err(CoreError::from)?;

    if ctx.runtime.config.cache_enabled {
        ctx.cache.put(cache_key, matches.clone());
    }

    let count = matches.len();
    Ok((json!({ "matches": matches, "from_cache": false }), count))
}

// ---------------------------------------------------------------------
// rename_symbol (C5)
// ---------------------------------------------------------------------

fn rename_symbol_info() -> ToolInfo {
    ToolInfo {
        name: "rename_symbol".to_string(),
        description: "Scope-aware rename of a symbol across a project, file or single function".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "old_name": { "type": "string" },
                "new_name": { "type": "string" },
                "language": { "type": "string" },
                "scope": { "type": "string", "enum": ["project", "file", "function"] },
                "root": { "type": "string" },
                "path": { "type": "string" },
                "function_name": { "type": "string" },
                "dry_run": { "type": "boolean", "default": true },
            },
            "required": ["old_name", "new_name", "language", "scope"],
        }),
    }
}

fn rename_symbol_handler<'a>(ctx: &'a AppContext, arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("rename_symbol");
        match rename_symbol_inner(ctx, arguments) {
            Ok(value) => {
                let _ = scope.finish();
                Ok(value)
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

fn rename_symbol_inner(ctx: &AppContext, arguments: Option<Value>) -> Result<Value, CoreError> {
    let args = args_or_missing(arguments)?;
    let old_name = arg_str(&args, "old_name")?;
    let new_name = arg_str(&args, "new_name")?;
    let language = language_arg(&args)?;
    let dry_run = arg_bool(&args, "dry_run", true);

    let scope_kind = arg_str(&args, "scope")?;
    let rename_scope = match scope_kind.as_str() {
        "project" => RenameScope::Project { root: PathBuf::from(arg_str(&args, "root")?) },
        "file" => RenameScope::File { path: PathBuf::from(arg_str(&args, "path")?) },
        "function" => RenameScope::Function {
            path: PathBuf::from(arg_str(&args, "path")?),
            function_name: arg_str(&args, "function_name")?,
        },
        other => return Err(CoreError::new(ErrorKind::Internal, format!("unknown rename scope '{other}'"))),
    };

    let rewrite_engine = RewriteEngine::new(&ctx.backup_store, ctx.validator.as_ref());
    let outcome = rename_symbol(&ctx.executor, &rewrite_engine, &old_name, &new_name, language, rename_scope, dry_run)?;

    Ok(match outcome {
        RenameOutcome::Applied { applied_paths, backup_id } => json!({
            "status": "applied",
            "applied_paths": applied_paths,
            "backup_id": backup_id,
        }),
        RenameOutcome::Preview(diffs) => json!({
            "status": "preview",
            "diffs": diffs.into_iter().map(|d| json!({ "path": d.path, "unified_diff": d.unified_diff })).collect::<Vec<_>>(),
        }),
        RenameOutcome::Conflict(conflicts) => json!({
            "status": "conflict",
            "conflicts": conflicts.into_iter().map(|c| format!("{c:?}")).collect::<Vec<_>>(),
        }),
    })
}

// ---------------------------------------------------------------------
// extract_function (C6)
// ---------------------------------------------------------------------

fn extract_function_info() -> ToolInfo {
    ToolInfo {
        name: "extract_function".to_string(),
        description: "Extract a contiguous line range of a file into a new function".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "start_line": { "type": "integer" },
                "end_line": { "type": "integer" },
                "new_name": { "type": "string" },
                "language": { "type": "string" },
                "dry_run": { "type": "boolean", "default": true },
            },
            "required": ["path", "start_line", "end_line", "new_name", "language"],
        }),
    }
}

fn extract_function_handler<'a>(ctx: &'a AppContext, arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("extract_function");
        match extract_function_inner(ctx, arguments) {
            Ok(value) => {
                let _ = scope.finish();
                Ok(value)
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

fn extract_function_inner(ctx: &AppContext, arguments: Option<Value>) -> Result<Value, CoreError> {
    let args = args_or_missing(arguments)?;
    let language = language_arg(&args)?;
    let request = ExtractFunctionRequest {
        path: PathBuf::from(arg_str(&args, "path")?),
        start_line: arg_usize(&args, "start_line", 0),
        end_line: arg_usize(&args, "end_line", 0),
        new_name: arg_str(&args, "new_name")?,
        language,
        dry_run: arg_bool(&args, "dry_run", true),
    };

    let rewrite_engine = RewriteEngine::new(&ctx.backup_store, ctx.validator.as_ref());
    let outcome = extract_function(&rewrite_engine, &request)?;

    Ok(match outcome {
        sg_refactor::ExtractOutcome::Applied { applied_paths, backup_id } => json!({
            "status": "applied",
            "applied_paths": applied_paths,
            "backup_id": backup_id,
        }),
        sg_refactor::ExtractOutcome::Preview(diffs) => json!({
            "status": "preview",
            "diffs": diffs.into_iter().map(|d| json!({ "path": d.path, "unified_diff": d.unified_diff })).collect::<Vec<_>>(),
        }),
    })
}

// ---------------------------------------------------------------------
// find_duplication (C7/C8)
// ---------------------------------------------------------------------

fn find_duplication_info() -> ToolInfo {
    ToolInfo {
        name: "find_duplication".to_string(),
        description: "Detect and rank groups of duplicated functions/methods/classes under a set of roots".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "roots": { "type": "array", "items": { "type": "string" } },
                "language": { "type": "string" },
                "min_lines": { "type": "integer", "default": 5 },
                "threshold": { "type": "number", "default": 0.8 },
                "exclude_globs": { "type": "array", "items": { "type": "string" } },
                "max_results": { "type": "integer" },
            },
            "required": ["roots", "language"],
        }),
    }
}

fn find_duplication_handler<'a>(ctx: &'a AppContext, arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("find_duplication");
        match find_duplication_inner(ctx, arguments) {
            Ok((value, group_count)) => {
                scope.set_counter("groups", group_count as i64);
                let _ = scope.finish();
                Ok(value)
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

fn find_duplication_inner(ctx: &AppContext, arguments: Option<Value>) -> Result<(Value, usize), CoreError> {
    let args = args_or_missing(arguments)?;
    let language = language_arg(&args)?;
    let roots = arg_paths(&args, "roots");
    let min_lines = arg_usize(&args, "min_lines", 5);
    let threshold = args.get("threshold").and_then(Value::as_f64).unwrap_or(0.8);
    let exclude_globs = arg_strings(&args, "exclude_globs");
    let max_results = args.get("max_results").and_then(Value::as_u64).map(|v| v as usize);

    let config = SimilarityConfig::default();
    let pipeline = SimilarityPipeline::new(config, None);
    let kinds = [ConstructKind::Function, ConstructKind::Method];

    let (constructs, groups) = sg_dedup::find_duplicate_groups(
        &ctx.executor,
        &roots,
        language,
        &kinds,
        min_lines,
        &exclude_globs,
        &pipeline,
        threshold,
    )
    .map_err(|e| CoreError::new(ErrorKind::Internal, e.to_string()))?;

    // `call_site_count` would need a project-wide caller graph this layer
    // doesn't build; a group's own member count is used as a conservative
    // proxy for how many places a merge would touch.
    let files: Vec<PathBuf> = constructs.iter().map(|c| c.path.clone()).collect();
    let coverage_root = roots.first().cloned().unwrap_or_else(|| PathBuf::from("."));
    let coverage_by_file: std::collections::HashMap<PathBuf, bool> =
        sg_coverage::has_tests_batch(&files, language, &coverage_root, true, ctx.runtime.config.default_worker_count)
            .map_err(|e| CoreError::new(ErrorKind::Internal, e.to_string()))?
            .into_iter()
            .collect();

    let inputs: Vec<RankingInputs> = groups
        .iter()
        .map(|group| {
            let metrics: Vec<sg_quality::FunctionMetrics> = group
                .members
                .iter()
                .map(|&idx| {
                    let construct = &constructs[idx];
                    let signature_line = construct.raw_body.lines().next().unwrap_or("");
                    sg_quality::compute_metrics(&construct.raw_body, signature_line, language)
                })
                .collect();
            let avg_cyclomatic = metrics.iter().map(|m| m.cyclomatic_complexity as f64).sum::<f64>() / metrics.len().max(1) as f64;
            let any_member_lacks_test_coverage = group
                .members
                .iter()
                .any(|&idx| !coverage_by_file.get(&constructs[idx].path).copied().unwrap_or(false));

            RankingInputs {
                avg_cyclomatic,
                any_member_lacks_test_coverage,
                call_site_count: group.members.len().saturating_sub(1),
            }
        })
        .collect();

    let ranked = rank_groups(&groups, &inputs, max_results);
    let group_count = ranked.len();

    let payload: Vec<Value> = ranked
        .iter()
        .map(|score| {
            let group = &groups[score.group_index];
            json!({
                "members": group.members.iter().map(|&idx| json!({
                    "path": constructs[idx].path,
                    "name": constructs[idx].name,
                })).collect::<Vec<_>>(),
                "files": group.files,
                "lines_saved_estimate": group.lines_saved_estimate,
                "min_pairwise_similarity": group.min_pairwise_similarity,
                "score": score.score,
                "savings": score.savings,
                "complexity": score.complexity,
                "risk": score.risk,
                "effort": score.effort,
            })
        })
        .collect();

    Ok((json!({ "groups": payload }), group_count))
}

// ---------------------------------------------------------------------
// assess_coverage_and_impact (C10)
// ---------------------------------------------------------------------

fn assess_impact_info() -> ToolInfo {
    ToolInfo {
        name: "assess_coverage_and_impact".to_string(),
        description: "Check whether files have tests and assess the blast radius of changing a symbol".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "files": { "type": "array", "items": { "type": "string" } },
                "language": { "type": "string" },
                "root": { "type": "string" },
                "is_public_symbol": { "type": "boolean", "default": false },
                "callers_count": { "type": "integer", "default": 0 },
                "cross_file": { "type": "boolean", "default": false },
            },
            "required": ["files", "language", "root"],
        }),
    }
}

fn assess_impact_handler<'a>(ctx: &'a AppContext, arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("assess_coverage_and_impact");
        match assess_impact_inner(ctx, arguments) {
            Ok(value) => {
                let _ = scope.finish();
                Ok(value)
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

fn assess_impact_inner(ctx: &AppContext, arguments: Option<Value>) -> Result<Value, CoreError> {
    let args = args_or_missing(arguments)?;
    let language = language_arg(&args)?;
    let files = arg_paths(&args, "files");
    let root = PathBuf::from(arg_str(&args, "root")?);

    let coverage = sg_coverage::has_tests_batch(&files, language, &root, true, ctx.runtime.config.default_worker_count)
        .map_err(|e| CoreError::new(ErrorKind::Internal, e.to_string()))?;

    let is_public_symbol = arg_bool(&args, "is_public_symbol", false);
    let callers_count = arg_usize(&args, "callers_count", 0);
    let cross_file = arg_bool(&args, "cross_file", false);
    let impact = sg_coverage::assess_impact(files.len(), is_public_symbol, callers_count, cross_file);

    Ok(json!({
        "coverage": coverage.into_iter().map(|(path, covered)| json!({ "path": path, "has_tests": covered })).collect::<Vec<_>>(),
        "impact": {
            "affected_files": impact.affected_files,
            "is_public_symbol": impact.is_public_symbol,
            "callers_count": impact.callers_count,
            "cross_file": impact.cross_file,
            "risk": format!("{:?}", impact.risk),
        },
    }))
}

// ---------------------------------------------------------------------
// compute_quality (C12)
// ---------------------------------------------------------------------

fn compute_quality_info() -> ToolInfo {
    ToolInfo {
        name: "compute_quality".to_string(),
        description: "Compute per-function complexity/quality metrics and structural lint findings for a file, recording the results in the metrics store".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "language": { "type": "string" },
                "project": { "type": "string" },
            },
            "required": ["path", "language", "project"],
        }),
    }
}

fn compute_quality_handler<'a>(ctx: &'a AppContext, arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("compute_quality");
        match compute_quality_inner(ctx, arguments) {
            Ok((value, function_count)) => {
                scope.set_counter("functions", function_count as i64);
                let _ = scope.finish();
                Ok(value)
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

fn compute_quality_inner(ctx: &AppContext, arguments: Option<Value>) -> Result<(Value, usize), CoreError> {
    let args = args_or_missing(arguments)?;
    let language = language_arg(&args)?;
    let path = PathBuf::from(arg_str(&args, "path")?);
    let project = arg_str(&args, "project")?;

    let source = std::fs::read_to_string(&path).map_err(|e| CoreError::new(ErrorKind::IoError, e.to_string()))?;
    let functions = sg_quality::enumerate_functions(&path, &source, language);
    let function_count = functions.len();
    let measured_at = chrono::Utc::now();

    let mut results = Vec::with_capacity(functions.len());
    for function in &functions {
        let metrics = sg_quality::compute_metrics(&function.body, &function.signature_line, language);
        let findings = sg_quality::lint_function(function, &metrics);

        ctx.metrics_store
            .record(&project, &path, &function.name, &metrics, measured_at)
            .map_err(CoreError::from)?;

        results.push(json!({
            "function": function.name,
            "start_line": function.start_line,
            "end_line": function.end_line,
            "metrics": {
                "cyclomatic_complexity": metrics.cyclomatic_complexity,
                "cognitive_complexity": metrics.cognitive_complexity,
                "max_nesting_depth": metrics.max_nesting_depth,
                "line_count": metrics.line_count,
                "parameter_count": metrics.parameter_count,
            },
            "findings": findings.into_iter().map(|f| json!({
                "rule_id": f.rule_id,
                "severity": f.severity,
                "message": f.message,
                "line": f.line,
            })).collect::<Vec<_>>(),
        }));
    }

    Ok((json!({ "functions": results }), function_count))
}

// ---------------------------------------------------------------------
// list_backups / restore_backup (C3/C4)
// ---------------------------------------------------------------------

fn list_backups_info() -> ToolInfo {
    ToolInfo {
        name: "list_backups".to_string(),
        description: "List available backup snapshots".to_string(),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}

fn list_backups_handler<'a>(ctx: &'a AppContext, _arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("list_backups");
        match ctx.backup_store.list() {
            Ok(backups) => {
                scope.set_counter("backups", backups.len() as i64);
                let _ = scope.finish();
                Ok(json!({
                    "backups": backups.into_iter().map(|b| json!({
                        "id": b.id,
                        "created_at": b.created_at,
                        "path_count": b.path_count,
                        "size": b.size,
                    })).collect::<Vec<_>>(),
                }))
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

fn restore_backup_info() -> ToolInfo {
    ToolInfo {
        name: "restore_backup".to_string(),
        description: "Restore every file captured by a backup snapshot".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": { "backup_id": { "type": "string" } },
            "required": ["backup_id"],
        }),
    }
}

fn restore_backup_handler<'a>(ctx: &'a AppContext, arguments: Option<Value>) -> ToolFuture<'a> {
    Box::pin(async move {
        let mut scope = EventScope::start("restore_backup");
        let result: Result<Value, CoreError> = (|| {
            let args = args_or_missing(arguments)?;
            let backup_id = arg_str(&args, "backup_id")?;
            let outcome = ctx.backup_store.restore(&backup_id)?;
            Ok(match outcome {
                Outcome::Success { value } => json!({ "status": "success", "restored_paths": value }),
                Outcome::PartialSuccess { value, succeeded, failed } => json!({
                    "status": "partial_success",
                    "restored_paths": value,
                    "succeeded": succeeded,
                    "failed": failed.into_iter().map(|(p, e)| json!({ "path": p, "error": e.message })).collect::<Vec<_>>(),
                }),
                Outcome::Failure { error } => return Err(error),
            })
        })();

        match result {
            Ok(value) => {
                let _ = scope.finish();
                Ok(value)
            }
            Err(err) => {
                let _ = scope.fail(&err.kind.to_string());
                Err(err)
            }
        }
    })
}

// ---------------------------------------------------------------------

fn entry(info: ToolInfo, handler: impl for<'a> Fn(&'a AppContext, Option<Value>) -> ToolFuture<'a> + Send + Sync + 'static) -> (ToolInfo, ToolHandler) {
    (info, Box::new(handler))
}

pub fn build_registry() -> Registry {
    Registry::new(vec![
        entry(find_code_info(), find_code_handler),
        entry(rename_symbol_info(), rename_symbol_handler),
        entry(extract_function_info(), extract_function_handler),
        entry(find_duplication_info(), find_duplication_handler),
        entry(assess_impact_info(), assess_impact_handler),
        entry(compute_quality_info(), compute_quality_handler),
        entry(list_backups_info(), list_backups_handler),
        entry(restore_backup_info(), restore_backup_handler),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::{Config, Runtime};
    use std::fs;

    fn test_context(base: &std::path::Path) -> AppContext {
        let mut config = Config::default();
        config.backup_root = base.join("backups");
        AppContext::new(Runtime::new(config))
    }

    #[tokio::test]
    async fn registry_lists_every_tool() {
        let registry = build_registry();
        let names: Vec<_> = registry.list().into_iter().map(|t| t.name).collect();
        assert!(names.contains(&"find_code".to_string()));
        assert!(names.contains(&"compute_quality".to_string()));
        assert!(names.contains(&"list_backups".to_string()));
    }

    #[tokio::test]
    async fn compute_quality_records_metrics_and_lints_a_long_function() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        let mut body = String::from("def handler():\n");
        for i in 0..60 {
            body.push_str(&format!("    x{i} = {i}\n"));
        }
        fs::write(&file, &body).unwrap();

        let ctx = test_context(dir.path());
        let registry = build_registry();
        let result = registry
            .call(
                &ctx,
                "compute_quality",
                Some(json!({ "path": file.display().to_string(), "language": "python", "project": "demo" })),
            )
            .await
            .unwrap();

        let functions = result["functions"].as_array().unwrap();
        assert_eq!(functions.len(), 1);
        let findings = functions[0]["findings"].as_array().unwrap();
        assert!(findings.iter().any(|f| f["rule_id"] == "function-too-long"));

        let history = ctx.metrics_store.history("demo", &file, "handler").unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn find_code_short_circuits_when_exclude_globs_remove_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "def handler():\n    pass\n").unwrap();

        let ctx = test_context(dir.path());
        let registry = build_registry();
        let result = registry
            .call(
                &ctx,
                "find_code",
                Some(json!({
                    "pattern": "def $NAME():",
                    "language": "python",
                    "roots": [dir.path().display().to_string()],
                    "exclude_globs": ["**/*.py"],
                })),
            )
            .await
            .unwrap();

        // Every candidate file is excluded, so this must resolve without
        // ever invoking the matcher binary.
        assert_eq!(result["matches"].as_array().unwrap().len(), 0);
        assert_eq!(result["from_cache"], false);
    }

    #[tokio::test]
    async fn find_code_short_circuits_when_max_file_size_excludes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "def handler():\n    pass\n").unwrap();

        let ctx = test_context(dir.path());
        let registry = build_registry();
        let result = registry
            .call(
                &ctx,
                "find_code",
                Some(json!({
                    "pattern": "def $NAME():",
                    "language": "python",
                    "roots": [dir.path().display().to_string()],
                    "max_file_size": 1,
                })),
            )
            .await
            .unwrap();

        assert_eq!(result["matches"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn list_backups_is_empty_before_any_backup_exists() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());
        let registry = build_registry();
        let result = registry.call(&ctx, "list_backups", None).await.unwrap();
        assert_eq!(result["backups"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unknown_tool_name_is_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_context(dir.path());
        let registry = build_registry();
        let err = registry.call(&ctx, "does_not_exist", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }
}
