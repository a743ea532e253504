pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{Expense, NewExpense};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for expense records.
///
/// Every call is scoped to an owner. Records belonging to anyone else behave
/// exactly like records that do not exist: `get`/`update` return `None` and
/// `delete` returns `false`, with nothing mutated.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Store a new record for `owner` and return it with its assigned id
    async fn create(&self, owner: Uuid, fields: NewExpense) -> Result<Expense, StoreError>;

    /// All records of `owner`, oldest first
    async fn list(&self, owner: Uuid) -> Result<Vec<Expense>, StoreError>;

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Expense>, StoreError>;

    /// Replace title, category and value of an owned record
    async fn update(&self, owner: Uuid, id: Uuid, fields: NewExpense) -> Result<Option<Expense>, StoreError>;

    /// Remove an owned record. Returns whether anything was removed.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;

    /// Cheap connectivity check used by `/health`
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Pick the backend from config: PostgreSQL when a URL is set, memory otherwise
pub async fn from_config(config: &DatabaseConfig) -> Result<Arc<dyn ExpenseStore>, StoreError> {
    match &config.url {
        Some(url) => Ok(Arc::new(PgStore::connect(url, config).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory expense store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
