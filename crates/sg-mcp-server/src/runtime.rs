//! Wires the `sg_core::Runtime`/`Config` pair into concrete component
//! instances, built once at startup (spec.md §9 "ambient mutable module
//! state" redesign note) and passed by reference into every tool handler.

use sg_backup::BackupStore;
use sg_core::Runtime;
use sg_executor::{Executor, QueryCache};
use sg_quality::MetricsStore;
use sg_rewrite::{balanced_delimiters_validator, SyntaxValidator};
use std::time::Duration;

pub struct AppContext {
    pub runtime: Runtime,
    pub executor: Executor,
    pub cache: QueryCache,
    pub backup_store: BackupStore,
    pub validator: Box<SyntaxValidator>,
    pub metrics_store: MetricsStore,
}

impl AppContext {
    pub fn new(runtime: Runtime) -> Self {
        let executor = Executor::new(
            runtime.config.matcher_binary.clone(),
            runtime.config.matcher_config_path.clone(),
        );
        let cache = QueryCache::new(
            runtime.config.cache_capacity,
            Duration::from_secs(runtime.config.cache_ttl_seconds),
        );
        let backup_store = BackupStore::new(runtime.config.backup_root.clone());
        let metrics_store = MetricsStore::new(runtime.config.backup_root.join("metrics.json"));

        Self {
            runtime,
            executor,
            cache,
            backup_store,
            validator: balanced_delimiters_validator(),
            metrics_store,
        }
    }
}
