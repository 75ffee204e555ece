use serde::Serialize;
use tracing::info;

use eshop_core::domain::customer::{CustomerId, CustomerInput, NewCustomer};
use eshop_core::errors::ApplicationError;

use super::CustomerService;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

impl CustomerService {
    /// Stores a new customer stamped with the current time.
    pub async fn create_customer(
        &self,
        fields: CustomerInput,
    ) -> Result<CustomerId, ApplicationError> {
        let created = self.collection.insert_one(NewCustomer::created_now(fields)).await?;
        info!(
            event_name = "customer.created",
            collection = self.collection.name(),
            customer_id = %created.id,
            "customer created"
        );
        Ok(created.id)
    }

    /// Overwrites every mutable field; identity and creation time are kept.
    pub async fn update_customer(
        &self,
        id: &str,
        fields: CustomerInput,
    ) -> Result<UpdateOutcome, ApplicationError> {
        let id: CustomerId = id.parse()?;
        let matched = self.collection.update_one(&id, fields).await?;
        if matched == 0 {
            return Ok(UpdateOutcome::NotFound);
        }

        info!(
            event_name = "customer.updated",
            collection = self.collection.name(),
            customer_id = %id,
            "customer updated"
        );
        Ok(UpdateOutcome::Updated)
    }

    pub async fn delete_customer(&self, id: &str) -> Result<DeleteOutcome, ApplicationError> {
        let id: CustomerId = id.parse()?;
        let deleted_count = self.collection.delete_one(&id).await?;

        info!(
            event_name = "customer.deleted",
            collection = self.collection.name(),
            customer_id = %id,
            deleted_count,
            "customer delete processed"
        );
        Ok(DeleteOutcome { deleted_count })
    }
}
