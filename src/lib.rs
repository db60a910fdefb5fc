pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::pipeline::{upsert_all, EtlPipeline, RunOutcome, RunReport, WritePolicy};
pub use app::scheduler::EtlScheduler;
pub use domain::book::{BookRecord, StoredBook};
pub use infra::catalog::{parse_catalog, CatalogSource, FetchError, HttpCatalogFetcher};
pub use storage::{BookStore, InMemoryBookStore, PostgresBookStore, StoreError};
