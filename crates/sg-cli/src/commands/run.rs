//! Analysis/refactor commands: each builds the same JSON arguments the MCP
//! tool handlers expect and dispatches through the shared registry, so the
//! CLI and the MCP server can never drift on argument shape.

use crate::cli::{Commands, OutputFormat, ScopeKind};
use crate::output;
use anyhow::{anyhow, Result};
use serde_json::json;
use sg_mcp_server::{AppContext, Registry};

pub async fn dispatch(ctx: &AppContext, registry: &Registry, command: Commands) -> Result<()> {
    match command {
        Commands::Find { pattern, rule_file, language, roots, max_file_size, exclude_globs, format } => {
            let rule_yaml = match rule_file {
                Some(path) => Some(std::fs::read_to_string(&path)?),
                None => None,
            };
            if pattern.is_none() && rule_yaml.is_none() {
                return Err(anyhow!("one of --pattern or --rule-file is required"));
            }
            let args = json!({
                "pattern": pattern,
                "rule_yaml": rule_yaml,
                "language": language,
                "roots": roots.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                "exclude_globs": exclude_globs,
                "max_file_size": max_file_size,
            });
            let result = registry.call(ctx, "find_code", Some(args)).await.map_err(|e| anyhow!(e.message))?;
            match format {
                OutputFormat::Json => output::print_json(&result),
                OutputFormat::Text => output::print_matches(&result),
            }
        }

        Commands::RenameSymbol { old_name, new_name, language, scope, path, function_name, dry_run } => {
            let scope_name = match scope {
                ScopeKind::Project => "project",
                ScopeKind::File => "file",
                ScopeKind::Function => "function",
            };
            let mut args = json!({
                "old_name": old_name,
                "new_name": new_name,
                "language": language,
                "scope": scope_name,
                "dry_run": dry_run,
            });
            match scope {
                ScopeKind::Project => {
                    let root = path.ok_or_else(|| anyhow!("--path is required (used as the project root) for --scope project"))?;
                    args["root"] = json!(root.display().to_string());
                }
                ScopeKind::File => {
                    let path = path.ok_or_else(|| anyhow!("--path is required for --scope file"))?;
                    args["path"] = json!(path.display().to_string());
                }
                ScopeKind::Function => {
                    let path = path.ok_or_else(|| anyhow!("--path is required for --scope function"))?;
                    let function_name = function_name.ok_or_else(|| anyhow!("--function-name is required for --scope function"))?;
                    args["path"] = json!(path.display().to_string());
                    args["function_name"] = json!(function_name);
                }
            }
            let result = registry.call(ctx, "rename_symbol", Some(args)).await.map_err(|e| anyhow!(e.message))?;
            output::print_rewrite_outcome(&result);
        }

        Commands::ExtractFunction { path, start_line, end_line, new_name, language, dry_run } => {
            let args = json!({
                "path": path.display().to_string(),
                "start_line": start_line,
                "end_line": end_line,
                "new_name": new_name,
                "language": language,
                "dry_run": dry_run,
            });
            let result = registry.call(ctx, "extract_function", Some(args)).await.map_err(|e| anyhow!(e.message))?;
            output::print_rewrite_outcome(&result);
        }

        Commands::FindDuplication { language, roots, min_lines, exclude_globs, threshold, max_results } => {
            let args = json!({
                "roots": roots.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                "language": language,
                "min_lines": min_lines,
                "exclude_globs": exclude_globs,
                "threshold": threshold,
                "max_results": max_results,
            });
            let result = registry.call(ctx, "find_duplication", Some(args)).await.map_err(|e| anyhow!(e.message))?;
            output::print_json(&result);
        }

        Commands::AssessImpact { files, language, root, is_public_symbol, callers_count, cross_file } => {
            let args = json!({
                "files": files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                "language": language,
                "root": root.display().to_string(),
                "is_public_symbol": is_public_symbol,
                "callers_count": callers_count,
                "cross_file": cross_file,
            });
            let result = registry.call(ctx, "assess_coverage_and_impact", Some(args)).await.map_err(|e| anyhow!(e.message))?;
            output::print_json(&result);
        }

        Commands::ComputeQuality { path, language, project } => {
            let args = json!({
                "path": path.display().to_string(),
                "language": language,
                "project": project,
            });
            let result = registry.call(ctx, "compute_quality", Some(args)).await.map_err(|e| anyhow!(e.message))?;
            output::print_json(&result);
        }

        Commands::ListBackups => {
            let result = registry.call(ctx, "list_backups", None).await.map_err(|e| anyhow!(e.message))?;
            output::print_json(&result);
        }

        Commands::RestoreBackup { backup_id } => {
            let args = json!({ "backup_id": backup_id });
            let result = registry.call(ctx, "restore_backup", Some(args)).await.map_err(|e| anyhow!(e.message))?;
            output::print_json(&result);
        }

        Commands::Doctor { .. } | Commands::Config { .. } => {
            unreachable!("handled before dispatch")
        }
    }

    Ok(())
}
