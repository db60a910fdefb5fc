//! One-shot pipeline run: fetch the catalog, upsert it, print the run report.
//!
//! A failed fetch or failed writes still exit 0 (the report says what happened);
//! only configuration and store connection problems are errors.

use books_catalog_etl::infra::logging;
use books_catalog_etl::{storage, EtlPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let store = storage::from_env().await?;
    let pipeline = EtlPipeline::from_env(store)?;

    let report = pipeline.run().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
