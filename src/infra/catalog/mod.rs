//! Extraction side of the pipeline: fetch the listing page, pull records out of it.

pub mod fetcher;
pub mod parser;
pub mod selectors;

pub use fetcher::{CatalogSource, FetchError, HttpCatalogFetcher};
pub use parser::parse_catalog;
