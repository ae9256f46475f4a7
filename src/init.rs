//! Initialization helpers for the application startup.

use crate::config::Config;
use crate::store::{FileRuleStore, RuleStore};
use std::sync::Arc;
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Opens the rule store configured by `store_path`.
pub fn init_store(config: &Config) -> Arc<dyn RuleStore> {
    info!("Using rule file {}", config.store_path);
    Arc::new(FileRuleStore::new(&config.store_path))
}
