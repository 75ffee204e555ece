//! Batched bulk loading of synthetic customers.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use eshop_core::domain::customer::NewCustomer;

use crate::repositories::{CustomerCollection, RepositoryError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid seed plan: {0}")]
    Validation(String),
    #[error("bulk write for batch {batch_number} failed: {source}")]
    BatchFailed {
        batch_number: u64,
        #[source]
        source: RepositoryError,
    },
    #[error("index creation failed: {0}")]
    Indexes(#[source] RepositoryError),
}

impl SeedError {
    /// True when the storage itself could not be reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::BatchFailed { source, .. } | Self::Indexes(source) => source.is_connectivity(),
        }
    }
}

/// Emitted after every flushed batch. Informational only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SeedProgress {
    pub batch_number: u64,
    pub batch_len: usize,
    pub inserted_so_far: u64,
    pub target: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub total_inserted: u64,
    pub batches: u64,
    pub failed_documents: u64,
}

type ProgressCallback = Box<dyn FnMut(&SeedProgress) + Send>;

pub struct BulkSeeder {
    batch_size: usize,
    progress: Option<ProgressCallback>,
}

impl BulkSeeder {
    pub fn new(batch_size: usize) -> Result<Self, SeedError> {
        if batch_size == 0 {
            return Err(SeedError::Validation("batch size must be greater than 0".to_string()));
        }
        Ok(Self { batch_size, progress: None })
    }

    pub fn on_progress(mut self, callback: impl FnMut(&SeedProgress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Writes `count` records drawn from `records` in batches, then ensures indexes.
    ///
    /// Rejected documents are counted and the run continues; a bulk call that
    /// fails outright aborts with [`SeedError::BatchFailed`].
    pub async fn seed<I>(
        &mut self,
        collection: &dyn CustomerCollection,
        records: I,
        count: u64,
    ) -> Result<SeedReport, SeedError>
    where
        I: IntoIterator<Item = NewCustomer>,
    {
        let mut report = SeedReport::default();
        let mut batch = Vec::with_capacity(self.batch_size.min(capacity_hint(count)));

        for record in records.into_iter().take(capacity_hint(count)) {
            batch.push(record);
            if batch.len() == self.batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                self.flush(collection, full, count, &mut report).await?;
            }
        }
        if !batch.is_empty() {
            self.flush(collection, batch, count, &mut report).await?;
        }

        collection.ensure_indexes().await.map_err(SeedError::Indexes)?;
        info!(
            event_name = "store.indexes.ensured",
            collection = collection.name(),
            "collection indexes ensured"
        );

        info!(
            event_name = "seed.completed",
            collection = collection.name(),
            total_inserted = report.total_inserted,
            batches = report.batches,
            failed_documents = report.failed_documents,
            "bulk seed completed"
        );
        Ok(report)
    }

    async fn flush(
        &mut self,
        collection: &dyn CustomerCollection,
        batch: Vec<NewCustomer>,
        target: u64,
        report: &mut SeedReport,
    ) -> Result<(), SeedError> {
        let batch_number = report.batches + 1;
        let batch_len = batch.len();
        let result = collection
            .bulk_insert_unordered(batch)
            .await
            .map_err(|source| SeedError::BatchFailed { batch_number, source })?;

        report.batches = batch_number;
        report.total_inserted += result.inserted;
        report.failed_documents += result.failures.len() as u64;

        if let Some(first) = result.failures.first() {
            warn!(
                event_name = "seed.batch.partial_failure",
                collection = collection.name(),
                batch_number,
                failed = result.failures.len(),
                first_index = first.index,
                first_error = %first.message,
                "some documents in the batch were rejected"
            );
        }

        let progress = SeedProgress {
            batch_number,
            batch_len,
            inserted_so_far: report.total_inserted,
            target,
        };
        info!(
            event_name = "seed.batch.flushed",
            collection = collection.name(),
            batch_number,
            batch_len,
            inserted_so_far = progress.inserted_so_far,
            target,
            "inserted {}/{}",
            progress.inserted_so_far,
            target
        );
        if let Some(callback) = self.progress.as_mut() {
            callback(&progress);
        }
        Ok(())
    }
}

fn capacity_hint(count: u64) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}
