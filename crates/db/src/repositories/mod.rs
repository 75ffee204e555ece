use async_trait::async_trait;
use thiserror::Error;

use eshop_core::domain::customer::{Customer, CustomerId, CustomerInput, NewCustomer};
use eshop_core::errors::ApplicationError;
use eshop_core::query::Predicate;

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerCollection;
pub use memory::InMemoryCustomerCollection;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not connect to database: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid collection name `{0}`")]
    InvalidCollectionName(String),
}

impl RepositoryError {
    /// True when the storage could not be reached, as opposed to rejecting the operation.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Database(error) => is_connectivity_error(error),
            Self::Decode(_) | Self::InvalidCollectionName(_) => false,
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Connection(error) => Self::Connection(error.to_string()),
            RepositoryError::Database(error) if is_connectivity_error(&error) => {
                Self::Connection(error.to_string())
            }
            RepositoryError::Database(error) => Self::Persistence(error.to_string()),
            RepositoryError::Decode(message) => Self::Persistence(message),
            error @ RepositoryError::InvalidCollectionName(_) => Self::Validation(error.to_string()),
        }
    }
}

fn is_connectivity_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed
    )
}

/// Result window for `find`; ordering is always ascending created-at, then id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub skip: u64,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkWriteFailure {
    /// Position of the rejected document within the submitted batch.
    pub index: usize,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub inserted: u64,
    pub failures: Vec<BulkWriteFailure>,
}

/// A customer collection in a document-style store.
#[async_trait]
pub trait CustomerCollection: Send + Sync {
    fn name(&self) -> &str;

    async fn insert_one(&self, record: NewCustomer) -> Result<Customer, RepositoryError>;

    async fn find(
        &self,
        predicate: &Predicate,
        options: FindOptions,
    ) -> Result<Vec<Customer>, RepositoryError>;

    async fn count(&self, predicate: &Predicate) -> Result<u64, RepositoryError>;

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Overwrites the mutable fields of one record; returns the matched count.
    async fn update_one(
        &self,
        id: &CustomerId,
        fields: CustomerInput,
    ) -> Result<u64, RepositoryError>;

    /// Returns the number of records removed (0 or 1).
    async fn delete_one(&self, id: &CustomerId) -> Result<u64, RepositoryError>;

    /// Writes every record it can; a rejected document does not stop the rest.
    /// An `Err` means the batch as a whole could not be written.
    async fn bulk_insert_unordered(
        &self,
        records: Vec<NewCustomer>,
    ) -> Result<BulkWriteResult, RepositoryError>;

    /// Idempotently creates the email, city and created-at indexes.
    async fn ensure_indexes(&self) -> Result<(), RepositoryError>;
}

#[cfg(test)]
mod tests {
    use eshop_core::errors::ApplicationError;

    use super::RepositoryError;

    #[test]
    fn pool_timeout_maps_to_connection_error() {
        let mapped = ApplicationError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(mapped, ApplicationError::Connection(_)));
    }

    #[test]
    fn row_level_failures_map_to_persistence_error() {
        let mapped = ApplicationError::from(RepositoryError::Database(sqlx::Error::RowNotFound));
        assert!(matches!(mapped, ApplicationError::Persistence(_)));

        let mapped = ApplicationError::from(RepositoryError::Decode("bad timestamp".to_string()));
        assert_eq!(mapped, ApplicationError::Persistence("bad timestamp".to_string()));
    }

    #[test]
    fn invalid_collection_name_maps_to_validation_error() {
        let mapped =
            ApplicationError::from(RepositoryError::InvalidCollectionName("a-b".to_string()));
        assert!(matches!(mapped, ApplicationError::Validation(ref message) if message.contains("a-b")));
    }
}
