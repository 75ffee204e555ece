pub mod connection;
pub mod repositories;
pub mod seeder;
pub mod service;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{
    CustomerCollection, InMemoryCustomerCollection, RepositoryError, SqlCustomerCollection,
};
pub use seeder::{BulkSeeder, SeedError, SeedProgress, SeedReport};
pub use service::{CustomerService, DeleteOutcome, UpdateOutcome};
pub use store::Store;
