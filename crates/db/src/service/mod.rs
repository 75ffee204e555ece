//! Customer reads and writes over any [`CustomerCollection`].

use std::sync::Arc;

use crate::repositories::CustomerCollection;

mod mutator;
mod reader;

pub use mutator::{DeleteOutcome, UpdateOutcome};

#[derive(Clone)]
pub struct CustomerService {
    collection: Arc<dyn CustomerCollection>,
}

impl CustomerService {
    pub fn new(collection: Arc<dyn CustomerCollection>) -> Self {
        Self { collection }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}
