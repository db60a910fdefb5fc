// src/bin/api_server.rs

use books_catalog_etl::infra::{config, logging};
use books_catalog_etl::{storage, transport, EtlPipeline, EtlScheduler};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    // --- Store Initialization ---
    let store = storage::from_env().await?;

    // --- Pipeline + Scheduler Initialization ---
    let pipeline = EtlPipeline::from_env(store.clone())?;
    let scheduler = Arc::new(EtlScheduler::new(pipeline));
    let interval = config::etl_interval()?;
    let on_startup = config::run_etl_on_startup()?;
    let _etl_task = scheduler.clone().start_background_task(interval, on_startup);
    match (on_startup, interval) {
        (true, Some(every)) => info!(interval_secs = every.as_secs(), "ETL runs at startup and on schedule"),
        (true, None) => info!("ETL runs once at startup"),
        (false, Some(every)) => info!(interval_secs = every.as_secs(), "ETL runs on schedule, first run after one interval"),
        (false, None) => info!("RUN_ETL_ON_STARTUP=false and no ETL_INTERVAL_SECS; ETL only runs via POST /etl/run"),
    }

    let app_state = transport::http::AppState {
        store,
        scheduler: scheduler.clone(),
    };

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(bind_addr.as_str()).await?;
    info!(addr = %bind_addr, "API server listening (Swagger UI at /swagger-ui)");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            scheduler.shutdown();
        }
    }

    Ok(())
}
