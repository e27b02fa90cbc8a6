//! `sg doctor` — component-by-component local setup diagnostics, grounded on
//! the teacher's `commands/doctor.rs` shape: each check prints a line and
//! returns `(issues_found, issues_fixed)`, summarized at the end with a
//! non-zero exit if anything remains unresolved.

use colored::Colorize;
use console::Term;
use sg_mcp_server::AppContext;
use std::fs;

pub async fn run(ctx: &AppContext, component: Option<String>, fix: bool) -> anyhow::Result<()> {
    let term = Term::stdout();
    let wants = |name: &str| component.as_deref().map(|c| c == name).unwrap_or(true);

    let mut issues_found = 0;
    let mut issues_fixed = 0;

    if wants("matcher") {
        let (found, fixed) = check_matcher(&term, ctx, fix).await;
        issues_found += found;
        issues_fixed += fixed;
    }
    if wants("cache") {
        let (found, fixed) = check_cache(&term, ctx, fix);
        issues_found += found;
        issues_fixed += fixed;
    }
    if wants("backups") {
        let (found, fixed) = check_backups(&term, ctx, fix);
        issues_found += found;
        issues_fixed += fixed;
    }
    if wants("config") {
        let (found, fixed) = check_config(&term, ctx, fix);
        issues_found += found;
        issues_fixed += fixed;
    }

    term.write_line("")?;
    if issues_found == 0 {
        term.write_line(&format!("{}", "everything looks healthy".green().bold()))?;
    } else if issues_found == issues_fixed {
        term.write_line(&format!("{}", format!("fixed {issues_fixed} issue(s)").green()))?;
    } else {
        term.write_line(&format!(
            "{}",
            format!("{issues_found} issue(s) found, {issues_fixed} fixed").red().bold()
        ))?;
        std::process::exit(1);
    }

    Ok(())
}

async fn check_matcher(term: &Term, ctx: &AppContext, _fix: bool) -> (usize, usize) {
    match ctx.executor.run(&["--version".to_string()], None).await {
        Ok(output) if output.exit_code == 0 => {
            let _ = term.write_line(&format!("{} matcher binary on PATH ({})", "✓".green(), output.stdout.trim()));
            (0, 0)
        }
        Ok(output) => {
            let _ = term.write_line(&format!("{} matcher binary exited with code {}", "✗".red(), output.exit_code));
            (1, 0)
        }
        Err(e) => {
            let _ = term.write_line(&format!(
                "{} matcher binary '{}' not runnable: {e}",
                "✗".red(),
                ctx.runtime.config.matcher_binary
            ));
            (1, 0)
        }
    }
}

fn check_cache(term: &Term, ctx: &AppContext, _fix: bool) -> (usize, usize) {
    if ctx.runtime.config.cache_enabled {
        let _ = term.write_line(&format!(
            "{} query cache enabled (capacity {}, ttl {}s)",
            "✓".green(),
            ctx.runtime.config.cache_capacity,
            ctx.runtime.config.cache_ttl_seconds
        ));
    } else {
        let _ = term.write_line(&format!("{} query cache disabled", "i".yellow()));
    }
    (0, 0)
}

fn check_backups(term: &Term, ctx: &AppContext, fix: bool) -> (usize, usize) {
    let root = &ctx.runtime.config.backup_root;
    if root.exists() {
        let _ = term.write_line(&format!("{} backup root exists ({})", "✓".green(), root.display()));
        (0, 0)
    } else if fix {
        match fs::create_dir_all(root) {
            Ok(()) => {
                let _ = term.write_line(&format!("{} created backup root ({})", "✓".green(), root.display()));
                (1, 1)
            }
            Err(e) => {
                let _ = term.write_line(&format!("{} could not create backup root: {e}", "✗".red()));
                (1, 0)
            }
        }
    } else {
        let _ = term.write_line(&format!(
            "{} backup root does not exist yet ({}); run with --fix to create it",
            "✗".red(),
            root.display()
        ));
        (1, 0)
    }
}

fn check_config(term: &Term, ctx: &AppContext, _fix: bool) -> (usize, usize) {
    let _ = term.write_line(&format!("{} configuration loaded (log level: {})", "✓".green(), ctx.runtime.config.log_level));
    (0, 0)
}
