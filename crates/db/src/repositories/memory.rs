use std::collections::BTreeSet;

use tokio::sync::RwLock;

use eshop_core::domain::customer::{Customer, CustomerId, CustomerInput, NewCustomer};
use eshop_core::query::Predicate;

use super::{BulkWriteResult, CustomerCollection, FindOptions, RepositoryError};

/// Process-local collection used by service and seeder tests.
pub struct InMemoryCustomerCollection {
    name: String,
    customers: RwLock<Vec<Customer>>,
    indexes: RwLock<BTreeSet<String>>,
}

impl InMemoryCustomerCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            customers: RwLock::new(Vec::new()),
            indexes: RwLock::new(BTreeSet::new()),
        }
    }

    pub async fn indexes(&self) -> Vec<String> {
        self.indexes.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.customers.read().await.is_empty()
    }
}

impl Default for InMemoryCustomerCollection {
    fn default() -> Self {
        Self::new("customers")
    }
}

#[async_trait::async_trait]
impl CustomerCollection for InMemoryCustomerCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, record: NewCustomer) -> Result<Customer, RepositoryError> {
        let customer = record.into_customer(CustomerId::generate());
        self.customers.write().await.push(customer.clone());
        Ok(customer)
    }

    async fn find(
        &self,
        predicate: &Predicate,
        options: FindOptions,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        let mut matching: Vec<Customer> =
            customers.iter().filter(|customer| predicate.matches(customer)).cloned().collect();
        matching.sort_by(|left, right| {
            left.created_at.cmp(&right.created_at).then_with(|| left.id.cmp(&right.id))
        });

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options.limit.map_or(usize::MAX, |limit| {
            usize::try_from(limit).unwrap_or(usize::MAX)
        });
        Ok(matching.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().filter(|customer| predicate.matches(customer)).count() as u64)
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.iter().find(|customer| customer.id == *id).cloned())
    }

    async fn update_one(
        &self,
        id: &CustomerId,
        fields: CustomerInput,
    ) -> Result<u64, RepositoryError> {
        let mut customers = self.customers.write().await;
        match customers.iter_mut().find(|customer| customer.id == *id) {
            Some(customer) => {
                customer.overwrite(fields);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: &CustomerId) -> Result<u64, RepositoryError> {
        let mut customers = self.customers.write().await;
        let before = customers.len();
        customers.retain(|customer| customer.id != *id);
        Ok((before - customers.len()) as u64)
    }

    async fn bulk_insert_unordered(
        &self,
        records: Vec<NewCustomer>,
    ) -> Result<BulkWriteResult, RepositoryError> {
        let mut customers = self.customers.write().await;
        let inserted = records.len() as u64;
        customers.extend(records.into_iter().map(|record| record.into_customer(CustomerId::generate())));
        Ok(BulkWriteResult { inserted, failures: Vec::new() })
    }

    async fn ensure_indexes(&self) -> Result<(), RepositoryError> {
        let mut indexes = self.indexes.write().await;
        for column in ["email", "city", "created_at"] {
            indexes.insert(format!("idx_{}_{column}", self.name));
        }
        Ok(())
    }
}
