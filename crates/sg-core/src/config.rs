//! Configuration and the `Runtime` value.
//!
//! spec.md §9 calls out "ambient mutable module state" (cache flags toggled
//! via CLI, a registered current config path, etc.) as a pattern requiring
//! re-architecture: it becomes a single explicit `Runtime`, built once at
//! startup and passed to every component. Precedence is explicit argument >
//! environment variable > default (spec.md §6).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Accepted configuration keys (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matcher_binary: String,
    pub matcher_config_path: Option<PathBuf>,
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub cache_ttl_seconds: u64,
    pub backup_root: PathBuf,
    pub default_worker_count: usize,
    pub log_level: String,
    pub error_reporting_endpoint: Option<String>,
    pub semantic_embedding_model: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matcher_binary: "ast-grep".to_string(),
            matcher_config_path: None,
            cache_enabled: true,
            cache_capacity: 100,
            cache_ttl_seconds: 300,
            backup_root: PathBuf::from(".ast-grep-backups"),
            default_worker_count: 4,
            log_level: "warn".to_string(),
            error_reporting_endpoint: None,
            semantic_embedding_model: None,
        }
    }
}

impl Config {
    /// Load defaults, then overlay a TOML file if present, then overlay
    /// environment variables (spec.md §6 "Environment variables consumed").
    /// `explicit_path`, if given, always wins over any discovered file.
    pub fn load(explicit_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Config::default();

        let candidate = explicit_path
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("sg-mcp/config.toml")));

        if let Some(path) = candidate {
            if path.exists() {
                let raw = std::fs::read_to_string(&path)?;
                config = toml::from_str(&raw)?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MATCHER_CONFIG") {
            self.matcher_config_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("CACHE_SIZE") {
            if let Ok(n) = v.parse() {
                self.cache_capacity = n;
            }
        }
        if let Ok(v) = std::env::var("CACHE_TTL_SECONDS") {
            if let Ok(n) = v.parse() {
                self.cache_ttl_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Ok(v) = std::env::var("BACKUP_ROOT") {
            self.backup_root = PathBuf::from(v);
        }
    }
}

/// The single value threaded through every component. Built once at
/// startup; never mutated in place (spec.md §9).
#[derive(Debug, Clone)]
pub struct Runtime {
    pub config: Config,
}

impl Runtime {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn from_default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.default_worker_count, 4);
        assert_eq!(config.backup_root, PathBuf::from(".ast-grep-backups"));
    }

    #[test]
    fn env_override_wins_over_default() {
        std::env::set_var("CACHE_SIZE", "42");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.cache_capacity, 42);
        std::env::remove_var("CACHE_SIZE");
    }
}
