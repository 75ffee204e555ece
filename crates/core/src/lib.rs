pub mod config;
pub mod domain;
pub mod errors;
pub mod pagination;
pub mod query;
pub mod synthetic;

pub use domain::customer::{Customer, CustomerId, CustomerInput, LifetimeValue, NewCustomer};
pub use errors::{ApplicationError, InterfaceError};
pub use pagination::{Page, PageRequest, PageSize};
pub use query::{build_query, CustomerFilter, Predicate};
pub use synthetic::SyntheticCustomers;
