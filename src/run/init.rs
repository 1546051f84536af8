//! Resource initialization.
//!
//! Storage is set up before the resolver so that a bad database path fails
//! fast, before any network configuration is read.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::Config;
use crate::dns::HickoryTxtResolver;
use crate::harvest::{HarvestSettings, Harvester};
use crate::initialization::init_resolver;
use crate::storage::{init_db_pool_with_path, run_migrations, SqliteSink, DEFAULT_DB_CONNECTIONS};

use super::resources::HarvestResources;

/// Opens the database and applies pending migrations.
pub(super) async fn init_storage(config: &Config) -> Result<SqliteSink> {
    let pool = init_db_pool_with_path(&config.db_path, DEFAULT_DB_CONNECTIONS)
        .await
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(SqliteSink::new(pool))
}

/// Validates `config` and builds the harvest engine.
///
/// This function performs the following steps:
/// 1. Validate configuration
/// 2. Open the database and run migrations
/// 3. Initialize the DNS resolver
/// 4. Wire both into a [`Harvester`]
pub(super) async fn init_resources(config: &Config) -> Result<HarvestResources> {
    config.validate().context("Invalid configuration")?;

    let sink = init_storage(config).await?;
    let resolver = init_resolver(config.dns_timeout()).context("Failed to initialize DNS resolver")?;

    let settings = HarvestSettings::from_config(config);
    info!(
        "Harvest settings: concurrency {}, {} attempts, {}ms retry delay, {}s DNS timeout",
        settings.capacity,
        settings.policy.max_attempts(),
        config.retry_delay_ms,
        config.dns_timeout_secs
    );

    let harvester = Harvester::new(
        Arc::new(HickoryTxtResolver::new(resolver)),
        Arc::new(sink.clone()),
        settings,
    );
    Ok(HarvestResources {
        harvester: Arc::new(harvester),
        sink,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_storage_creates_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            db_path: dir.path().join("nested").join("records.db"),
            ..Default::default()
        };
        let sink = init_storage(&config).await.expect("storage should open");
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('domain_records', 'domain_txt_records', 'batches')",
        )
        .fetch_one(sink.pool())
        .await
        .expect("count tables");
        assert_eq!(tables, 3);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("never.db");
        let config = Config {
            db_path: db_path.clone(),
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(init_resources(&config).await.is_err());
        assert!(!db_path.exists());
    }
}
