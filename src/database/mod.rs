pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod store;

use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseEngine};

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::Store;

/// Opens the backend selected by `DATABASE_ENGINE`
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, DatabaseError> {
    match config.engine {
        DatabaseEngine::Postgres => Ok(Arc::new(PgStore::connect(config).await?)),
        DatabaseEngine::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
