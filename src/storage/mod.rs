//! Persistence for the `books` collection.
//!
//! The pipeline and the HTTP handlers both take an explicitly constructed
//! `Arc<dyn BookStore>`; there is no process-wide database handle.

use crate::domain::book::{BookRecord, StoredBook};
use crate::infra::config::{self, StoreBackend};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryBookStore;
pub use postgres::PostgresBookStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another document already holds this title (the natural key is unique).
    #[error("a book titled '{0}' already exists")]
    DuplicateTitle(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What a keyed upsert did to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(StoredBook),
    Updated(StoredBook),
}

impl UpsertOutcome {
    pub fn book(&self) -> &StoredBook {
        match self {
            UpsertOutcome::Inserted(b) | UpsertOutcome::Updated(b) => b,
        }
    }
}

/// CRUD by identifier plus the title-keyed upsert used by the pipeline.
///
/// Identifiers are opaque strings; one that the backend cannot interpret is
/// treated as "no such book", not as an error.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Cheap round-trip used by `/health` and `preflight`.
    async fn ping(&self) -> StoreResult<()>;

    /// All books, ordered by identifier.
    async fn list(&self) -> StoreResult<Vec<StoredBook>>;

    async fn get(&self, id: &str) -> StoreResult<Option<StoredBook>>;

    async fn insert(&self, record: &BookRecord) -> StoreResult<StoredBook>;

    /// Overwrites every field of the book with `id`. `None` when absent.
    async fn replace(&self, id: &str, record: &BookRecord) -> StoreResult<Option<StoredBook>>;

    /// `true` when a book was removed.
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Single atomic "update where title matches, else insert". The identifier of an
    /// existing document never changes.
    async fn upsert_by_title(&self, record: &BookRecord) -> StoreResult<UpsertOutcome>;
}

/// Builds the store selected by `STORE_BACKEND`.
pub async fn from_env() -> anyhow::Result<Arc<dyn BookStore>> {
    match config::store_backend()? {
        StoreBackend::Postgres => {
            let url = config::database_url()?;
            let store = PostgresBookStore::connect(&url, config::db_max_connections()?).await?;
            info!("connected to postgres book store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("using in-memory book store (data is lost on exit)");
            Ok(Arc::new(InMemoryBookStore::new()))
        }
    }
}
