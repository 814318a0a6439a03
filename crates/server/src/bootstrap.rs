use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use fretado_core::config::{AppConfig, ConfigError, LoadOptions};
use fretado_core::validation::PriceValidator;
use fretado_db::{connect_with_settings, migrations, DbPool, SqlPricingStore, SqlReferenceStore};

use crate::erp::ErpClient;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub validator: Arc<PriceValidator>,
    pub erp: Option<Arc<ErpClient>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let validator = Arc::new(PriceValidator::new(
        Arc::new(SqlReferenceStore::new(db_pool.clone())),
        Arc::new(SqlPricingStore::new(db_pool.clone())),
    ));

    let erp = ErpClient::from_config(&config.erp).map(Arc::new);
    info!(
        event_name = "system.bootstrap.erp_mode",
        correlation_id = "bootstrap",
        erp_enabled = erp.is_some(),
        "erp document source configured"
    );

    Ok(Application { config, db_pool, validator, erp })
}

#[cfg(test)]
mod tests {
    use fretado_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_connects_migrates_and_wires_the_validator() {
        let app = bootstrap(options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('state', 'city', 'carrier', 'route', 'weight_bracket', 'price_entry')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("reference tables should exist after bootstrap");
        assert_eq!(table_count, 6);

        assert!(app.erp.is_none(), "erp integration is disabled by default");
        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_erp_config() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                erp_enabled: Some(true),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap must fail").to_string();
        assert!(message.contains("erp.base_url"));
    }
}
