pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;
pub mod validation;

pub use database::MongoStore;
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics, record_inquiry_created, record_inquiry_listed};
pub use store::{DocumentStore, StoreError, StoreHandle, StoreHealth, StoreState};
pub use validation::{validate, GatewayError, ValidatedInquiry};
