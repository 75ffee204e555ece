use eshop_core::config::{AppConfig, ConfigError};
use eshop_db::{RepositoryError, Store};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub store: Store,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("document store unavailable: {0}")]
    Store(#[source] RepositoryError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store = Store::open(&config.database, &config.store).await.map_err(BootstrapError::Store)?;
    let default_collection = store.collection(None).await.map_err(BootstrapError::Store)?;
    info!(
        event_name = "system.bootstrap.store_ready",
        correlation_id = "bootstrap",
        table = default_collection.table(),
        "default collection ready"
    );

    Ok(Application { config, store })
}
