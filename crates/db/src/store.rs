use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use eshop_core::config::{is_valid_identifier, DatabaseConfig, StoreConfig};

use crate::repositories::{CustomerCollection, RepositoryError, SqlCustomerCollection};
use crate::{connect, DbPool};

/// Owns the process-wide pool and hands out collection handles.
///
/// Cloning is cheap: clones share the same pool.
#[derive(Clone, Debug)]
pub struct Store {
    pool: DbPool,
    database_name: String,
    default_collection: String,
    prepared: Arc<Mutex<HashSet<String>>>,
}

impl Store {
    pub async fn open(
        database: &DatabaseConfig,
        store: &StoreConfig,
    ) -> Result<Self, RepositoryError> {
        let pool = connect(database).await.map_err(RepositoryError::Connection)?;

        let opened = Self::from_pool(pool, &database.name, &store.default_collection)?;
        // first acquire is lazy for some URLs; surface unreachable storage now
        opened.ping().await.map_err(|error| match error {
            RepositoryError::Database(source) => RepositoryError::Connection(source),
            other => other,
        })?;

        info!(
            event_name = "store.opened",
            database = %opened.database_name,
            default_collection = %opened.default_collection,
            max_connections = database.max_connections,
            "document store opened"
        );
        Ok(opened)
    }

    pub fn from_pool(
        pool: DbPool,
        database_name: &str,
        default_collection: &str,
    ) -> Result<Self, RepositoryError> {
        for name in [database_name, default_collection] {
            if !is_valid_identifier(name) {
                return Err(RepositoryError::InvalidCollectionName(name.to_string()));
            }
        }
        Ok(Self {
            pool,
            database_name: database_name.to_string(),
            default_collection: default_collection.to_string(),
            prepared: Arc::default(),
        })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    /// Resolves a collection by name. The first resolution of a table creates
    /// it and its indexes; later ones reuse that setup.
    /// `None` or an empty name selects the configured default.
    pub async fn collection(
        &self,
        name: Option<&str>,
    ) -> Result<SqlCustomerCollection, RepositoryError> {
        let collection = self.handle(name)?;

        let mut prepared = self.prepared.lock().await;
        if prepared.contains(collection.table()) {
            debug!(
                event_name = "store.collection.reused",
                table = collection.table(),
                "collection already prepared"
            );
            return Ok(collection);
        }

        collection.create_table().await?;
        collection.ensure_indexes().await?;
        prepared.insert(collection.table().to_string());

        info!(
            event_name = "store.collection.resolved",
            collection = collection.name(),
            table = collection.table(),
            "collection resolved"
        );
        Ok(collection)
    }

    /// Resolves a collection for a bulk load: the table exists afterwards but
    /// index creation is left to the loader once the data is in.
    pub async fn collection_for_bulk_load(
        &self,
        name: Option<&str>,
    ) -> Result<SqlCustomerCollection, RepositoryError> {
        let collection = self.handle(name)?;
        collection.create_table().await?;
        debug!(
            event_name = "store.collection.bulk_target",
            table = collection.table(),
            "bulk load target ready"
        );
        Ok(collection)
    }

    fn handle(&self, name: Option<&str>) -> Result<SqlCustomerCollection, RepositoryError> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => self.default_collection.as_str(),
        };
        if !is_valid_identifier(name) {
            return Err(RepositoryError::InvalidCollectionName(name.to_string()));
        }

        let table = format!("{}_{}", self.database_name, name);
        Ok(SqlCustomerCollection::new(self.pool.clone(), name.to_string(), table))
    }

    pub async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
