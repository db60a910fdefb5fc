//! Pipeline end-to-end against a local catalog server:
//! 1) Serve a books.toscrape-shaped page (and a broken / slow variant) from axum.
//! 2) Run the real HTTP fetcher → parser → normalizer → upserter into the in-memory store.
//! 3) Check idempotence, keyed updates, fetch-failure short-circuit, and run overlap.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use books_catalog_etl::storage::BookStore;
use books_catalog_etl::{
    BookRecord, CatalogSource, EtlPipeline, EtlScheduler, FetchError, HttpCatalogFetcher,
    InMemoryBookStore, RunOutcome,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const CATALOG_PAGE: &str = include_str!("fixtures/catalog_page.html");

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Starts the fake catalog site on an ephemeral port and returns its base URL.
async fn spawn_catalog_site() -> Result<String, Box<dyn std::error::Error>> {
    let app = Router::new()
        .route("/", get(|| async { axum::response::Html(CATALOG_PAGE) }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                axum::response::Html(CATALOG_PAGE)
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok(format!("http://{}", addr))
}

fn pipeline_for(url: String, store: Arc<InMemoryBookStore>) -> EtlPipeline {
    let fetcher = HttpCatalogFetcher::new(url, Duration::from_secs(10)).unwrap();
    EtlPipeline::new(Arc::new(fetcher), store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rerun_is_idempotent() -> TestResult {
    let base = spawn_catalog_site().await?;
    let store = Arc::new(InMemoryBookStore::new());
    let pipeline = pipeline_for(format!("{}/", base), store.clone());

    let first = pipeline.run().await;
    assert_eq!(first.outcome, RunOutcome::Completed);
    assert_eq!(first.parsed, 4);
    assert_eq!(first.inserted, 4);
    assert_eq!(first.failed, 0);
    let before = store.list().await?;

    let second = pipeline.run().await;
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 4);
    let after = store.list().await?;

    // Same documents, same identifiers, same field values.
    assert_eq!(before, after);
    let titles: HashSet<&str> = after.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles.len(), after.len());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stored_fields_are_normalized() -> TestResult {
    let base = spawn_catalog_site().await?;
    let store = Arc::new(InMemoryBookStore::new());
    pipeline_for(format!("{}/", base), store.clone()).run().await;

    let books = store.list().await?;
    let by_title = |t: &str| books.iter().find(|b| b.title == t).cloned();

    let attic = by_title("A light in the attic").expect("attic stored");
    assert_eq!(attic.price, "£51.77");
    assert_eq!(attic.availability, "In stock");

    let velvet = by_title("Tipping the velvet").expect("velvet stored");
    assert_eq!(velvet.price, "£53.74");
    assert_eq!(velvet.availability, "In stock (20 available)");

    let foo = by_title("Foo").expect("foo stored");
    assert_eq!(foo.price, "£1.50");

    // Entry without a price element is kept with an empty price.
    let soumission = by_title("Soumission").expect("soumission stored");
    assert_eq!(soumission.price, "");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lowercase_source_title_updates_existing_document() -> TestResult {
    let base = spawn_catalog_site().await?;
    let store = Arc::new(InMemoryBookStore::new());
    let existing = store
        .insert(&BookRecord::new("Foo", "£0.01", "Out of stock"))
        .await?;

    let report = pipeline_for(format!("{}/", base), store.clone()).run().await;
    assert_eq!(report.inserted, 3);
    assert_eq!(report.updated, 1);

    let foo = store.get(&existing.id).await?.expect("same id still present");
    assert_eq!(foo.title, "Foo");
    assert_eq!(foo.price, "£1.50");
    assert_eq!(foo.availability, "In stock");
    assert_eq!(store.len().await, 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_http_500_leaves_store_untouched() -> TestResult {
    let base = spawn_catalog_site().await?;
    let store = Arc::new(InMemoryBookStore::new());
    let seeded = store
        .insert(&BookRecord::new("Keep me", "£2.00", "In stock"))
        .await?;

    let report = pipeline_for(format!("{}/broken", base), store.clone()).run().await;
    assert_eq!(report.outcome, RunOutcome::SourceUnavailable);
    assert_eq!(report.writes(), 0);
    assert!(report.error.as_deref().unwrap_or("").contains("500"));

    assert_eq!(store.list().await?, vec![seeded]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetch_timeout_is_a_non_fatal_empty_run() -> TestResult {
    let base = spawn_catalog_site().await?;
    let store = Arc::new(InMemoryBookStore::new());
    let fetcher = HttpCatalogFetcher::new(format!("{}/slow", base), Duration::from_millis(300))?;
    let pipeline = EtlPipeline::new(Arc::new(fetcher), store.clone());

    let report = pipeline.run().await;
    assert_eq!(report.outcome, RunOutcome::SourceUnavailable);
    assert!(store.is_empty().await);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unreachable_catalog_is_a_non_fatal_empty_run() -> TestResult {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let store = Arc::new(InMemoryBookStore::new());
    let report = pipeline_for(format!("http://{}/", addr), store.clone()).run().await;
    assert_eq!(report.outcome, RunOutcome::SourceUnavailable);
    assert!(store.is_empty().await);
    Ok(())
}

/// Returns the fixture after a delay, so a run stays in flight for a while.
struct SlowSource {
    delay: Duration,
}

#[async_trait]
impl CatalogSource for SlowSource {
    fn url(&self) -> &str {
        "memory://slow"
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        tokio::time::sleep(self.delay).await;
        Ok(CATALOG_PAGE.to_string())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_run_is_skipped() -> TestResult {
    let store = Arc::new(InMemoryBookStore::new());
    let source = Arc::new(SlowSource {
        delay: Duration::from_millis(300),
    });
    let scheduler = EtlScheduler::new(EtlPipeline::new(source, store.clone()));

    let (a, b) = tokio::join!(scheduler.run_exclusive(), scheduler.run_exclusive());
    assert_eq!(a.outcome, RunOutcome::Completed);
    assert_eq!(b.outcome, RunOutcome::Skipped);

    // Only the completed run is remembered.
    let last = scheduler.last_report().await.expect("a run finished");
    assert_eq!(last.outcome, RunOutcome::Completed);
    assert_eq!(store.len().await, 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scheduled_runs_stop_on_shutdown() -> TestResult {
    let store = Arc::new(InMemoryBookStore::new());
    let source = Arc::new(SlowSource {
        delay: Duration::from_millis(10),
    });
    let scheduler = Arc::new(EtlScheduler::new(EtlPipeline::new(source, store.clone())));

    let handle = scheduler
        .clone()
        .start_background_task(Some(Duration::from_millis(50)), true);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(scheduler.last_report().await.is_some());

    scheduler.shutdown();
    tokio::time::timeout(Duration::from_secs(2), handle).await??;

    // Repeated scheduled runs never duplicate documents.
    assert_eq!(store.len().await, 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_schedule_without_startup_run_waits_one_interval() -> TestResult {
    let store = Arc::new(InMemoryBookStore::new());
    let source = Arc::new(SlowSource {
        delay: Duration::from_millis(10),
    });
    let scheduler = Arc::new(EtlScheduler::new(EtlPipeline::new(source, store.clone())));

    let handle = scheduler
        .clone()
        .start_background_task(Some(Duration::from_millis(300)), false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(scheduler.last_report().await.is_none());
    assert!(store.is_empty().await);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let last = scheduler.last_report().await.expect("scheduled run finished");
    assert_eq!(last.outcome, RunOutcome::Completed);
    assert_eq!(store.len().await, 4);

    scheduler.shutdown();
    tokio::time::timeout(Duration::from_secs(2), handle).await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_interval_and_no_startup_run_does_nothing() -> TestResult {
    let store = Arc::new(InMemoryBookStore::new());
    let source = Arc::new(SlowSource {
        delay: Duration::from_millis(1),
    });
    let scheduler = Arc::new(EtlScheduler::new(EtlPipeline::new(source, store.clone())));

    let handle = scheduler.clone().start_background_task(None, false);
    tokio::time::timeout(Duration::from_secs(2), handle).await??;
    assert!(scheduler.last_report().await.is_none());
    assert!(store.is_empty().await);
    Ok(())
}
