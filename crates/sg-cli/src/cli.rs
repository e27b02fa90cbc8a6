//! Clap-derive command tree, grounded on the teacher's `cli.rs` layout:
//! global flags carried on `Cli`, one `Commands` variant per operation, with
//! a `Doctor` and a `Config` housekeeping command alongside the analysis
//! commands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "sg", version, about = "Structural code analysis over ast-grep")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a config TOML file; overrides the discovered default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug-level logging and full error chains.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable info-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all but warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a pattern or rule match over one or more roots.
    Find {
        /// ast-grep pattern string, mutually exclusive with --rule-file.
        #[arg(long)]
        pattern: Option<String>,

        /// Path to a YAML rule file, mutually exclusive with --pattern.
        #[arg(long)]
        rule_file: Option<PathBuf>,

        #[arg(long)]
        language: String,

        #[arg(long = "root", required = true)]
        roots: Vec<PathBuf>,

        #[arg(long)]
        max_file_size: Option<u64>,

        #[arg(long = "exclude")]
        exclude_globs: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Rename a symbol within a project, a file, or a single function.
    RenameSymbol {
        #[arg(long)]
        old_name: String,

        #[arg(long)]
        new_name: String,

        #[arg(long)]
        language: String,

        #[arg(long, value_enum, default_value_t = ScopeKind::Project)]
        scope: ScopeKind,

        #[arg(long)]
        path: Option<PathBuf>,

        #[arg(long)]
        function_name: Option<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Extract a line range of a function body into a new function.
    ExtractFunction {
        #[arg(long)]
        path: PathBuf,

        #[arg(long)]
        start_line: usize,

        #[arg(long)]
        end_line: usize,

        #[arg(long)]
        new_name: String,

        #[arg(long)]
        language: String,

        #[arg(long)]
        dry_run: bool,
    },

    /// Detect and rank duplicated constructs across a set of roots.
    FindDuplication {
        #[arg(long)]
        language: String,

        #[arg(long = "root", required = true)]
        roots: Vec<PathBuf>,

        #[arg(long, default_value_t = 5)]
        min_lines: usize,

        #[arg(long = "exclude")]
        exclude_globs: Vec<String>,

        #[arg(long, default_value_t = 0.8)]
        threshold: f64,

        #[arg(long, default_value_t = 20)]
        max_results: usize,
    },

    /// Assess test coverage presence and refactor impact for a set of files.
    AssessImpact {
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        language: String,

        #[arg(long)]
        root: PathBuf,

        #[arg(long)]
        is_public_symbol: bool,

        #[arg(long, default_value_t = 0)]
        callers_count: usize,

        #[arg(long)]
        cross_file: bool,
    },

    /// Compute complexity/quality metrics and lint findings for a file.
    ComputeQuality {
        #[arg(long)]
        path: PathBuf,

        #[arg(long)]
        language: String,

        #[arg(long, default_value = "default")]
        project: String,
    },

    /// List backups recorded in the configured backup root.
    ListBackups,

    /// Restore a previously created backup by id.
    RestoreBackup {
        #[arg(long)]
        backup_id: String,
    },

    /// Diagnose and optionally repair local setup problems.
    Doctor {
        /// Restrict to one component: matcher, cache, backups, config.
        component: Option<String>,

        #[arg(long)]
        fix: bool,
    },

    /// Inspect or edit the active configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the fully resolved configuration as JSON.
    Show,
    /// Print the value of a single configuration key.
    Get { key: String },
    /// Print the location the configuration would be loaded from.
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Project,
    File,
    Function,
}
