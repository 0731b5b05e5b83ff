//! Persistence and client lifecycle services.

mod clients;
pub mod error;
mod memory_store;
mod mongo_store;
mod soft_delete;
pub mod store;

pub use clients::ClientService;
pub use error::{ServiceError, StoreError};
pub use memory_store::MemoryStore;
pub use mongo_store::MongoStore;
pub use soft_delete::soft_delete;
pub use store::{EntityStore, Filter, Update};
