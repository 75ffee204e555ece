use eshop_core::domain::customer::{Customer, CustomerId};
use eshop_core::errors::ApplicationError;
use eshop_core::pagination::{Page, PageRequest};
use eshop_core::query::Predicate;

use super::CustomerService;
use crate::repositories::FindOptions;

impl CustomerService {
    /// One window of matching customers, oldest first, plus the full match count.
    pub async fn read_page(
        &self,
        predicate: &Predicate,
        request: PageRequest,
    ) -> Result<Page<Customer>, ApplicationError> {
        let options = FindOptions { skip: request.offset(), limit: Some(request.limit()) };
        let items = self.collection.find(predicate, options).await?;
        let total_matching = self.collection.count(predicate).await?;

        Ok(Page { items, total_matching, page: request.page(), page_size: request.size() })
    }

    pub async fn find_customer(&self, id: &str) -> Result<Option<Customer>, ApplicationError> {
        let id: CustomerId = id.parse()?;
        Ok(self.collection.find_by_id(&id).await?)
    }
}
