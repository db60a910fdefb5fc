//! The extract → transform → load pipeline.
//!
//! One run fetches the listing page, parses it, normalizes the records and upserts
//! them by title. Nothing escapes a run as an error: fetch failures short-circuit
//! into an empty run, and write failures are counted per record.

use crate::domain::book::{normalize, BookRecord};
use crate::infra::catalog::{parse_catalog, CatalogSource, HttpCatalogFetcher};
use crate::infra::config;
use crate::storage::{BookStore, UpsertOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Transform and load ran (possibly with individual write failures).
    Completed,
    /// Fetch failed; the store was not touched.
    SourceUnavailable,
    /// Another run was still in flight.
    Skipped,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct RunReport {
    #[schema(value_type = String)]
    pub started_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
    /// Records extracted from the markup.
    pub parsed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    /// Fetch error text when `outcome` is `source_unavailable`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    fn empty(started_at: DateTime<Utc>, outcome: RunOutcome, error: Option<String>) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            outcome,
            parsed: 0,
            inserted: 0,
            updated: 0,
            failed: 0,
            error,
        }
    }

    pub fn skipped() -> Self {
        Self::empty(Utc::now(), RunOutcome::Skipped, None)
    }

    pub fn writes(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Per-record retry for failed writes. The default (no retries) is the baseline behavior.
#[derive(Debug, Clone, Copy)]
pub struct WritePolicy {
    pub max_retries: u32,
    /// Doubled after every failed attempt.
    pub base_backoff: Duration,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertReport {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Writes each record with one keyed upsert. Records are independent: a failed
/// write is logged and counted, earlier writes stand, later ones still run.
/// A title repeated within `records` ends with the last occurrence's fields.
pub async fn upsert_all(
    store: &dyn BookStore,
    records: &[BookRecord],
    policy: WritePolicy,
) -> UpsertReport {
    info!(records = records.len(), "starting data loading");
    let mut report = UpsertReport::default();

    for record in records {
        let mut attempt = 0u32;
        loop {
            match store.upsert_by_title(record).await {
                Ok(UpsertOutcome::Inserted(_)) => {
                    report.inserted += 1;
                    break;
                }
                Ok(UpsertOutcome::Updated(_)) => {
                    report.updated += 1;
                    break;
                }
                Err(e) if attempt < policy.max_retries => {
                    let backoff = policy.base_backoff.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(
                        title = %record.title,
                        attempt,
                        max_retries = policy.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "upsert failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    error!(title = %record.title, error = %e, "upsert failed");
                    report.failed += 1;
                    break;
                }
            }
        }
    }

    info!(
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failed,
        "data loading complete"
    );
    report
}

/// Fetcher → parser → normalizer → upserter, wired to explicit dependencies.
#[derive(Clone)]
pub struct EtlPipeline {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn BookStore>,
    policy: WritePolicy,
}

impl EtlPipeline {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<dyn BookStore>) -> Self {
        Self {
            source,
            store,
            policy: WritePolicy::default(),
        }
    }

    /// HTTP fetcher and write policy from the environment, writing into `store`.
    pub fn from_env(store: Arc<dyn BookStore>) -> anyhow::Result<Self> {
        let fetcher = HttpCatalogFetcher::new(config::catalog_url(), config::fetch_timeout()?)?;
        let policy = WritePolicy {
            max_retries: config::write_retries()?,
            base_backoff: config::retry_backoff()?,
        };
        Ok(Self::new(Arc::new(fetcher), store).with_write_policy(policy))
    }

    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the pipeline once. Never fails; see [`RunReport::outcome`].
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        info!(url = %self.source.url(), "running ETL process");

        let markup = match self.source.fetch().await {
            Ok(markup) => markup,
            Err(e) => {
                error!(url = %self.source.url(), error = %e, "extraction failed, skipping transform and load");
                return RunReport::empty(
                    started_at,
                    RunOutcome::SourceUnavailable,
                    Some(e.to_string()),
                );
            }
        };

        let records = parse_catalog(&markup);
        info!(books = records.len(), "extracted books");

        let records = normalize(records);
        info!(books = records.len(), "data transformation complete");

        let written = upsert_all(self.store.as_ref(), &records, self.policy).await;

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            outcome: RunOutcome::Completed,
            parsed: records.len(),
            inserted: written.inserted,
            updated: written.updated,
            failed: written.failed,
            error: None,
        };
        info!(
            parsed = report.parsed,
            inserted = report.inserted,
            updated = report.updated,
            failed = report.failed,
            "ETL process completed"
        );
        report
    }
}
