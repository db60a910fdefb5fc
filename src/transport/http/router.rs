use crate::app::pipeline::{RunOutcome, RunReport};
use crate::domain::book::{BookRecord, StoredBook};
use crate::transport::http::handlers::{books, etl, health};
use crate::transport::http::types::{ApiResponse, MessageResponse};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        books::list_books_handler,
        books::get_book_handler,
        books::create_book_handler,
        books::update_book_handler,
        books::delete_book_handler,
        etl::run_etl_handler,
        etl::last_run_handler
    ),
    components(schemas(
        ApiResponse,
        MessageResponse,
        BookRecord,
        StoredBook,
        RunReport,
        RunOutcome
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/books",
            get(books::list_books_handler).post(books::create_book_handler),
        )
        .route(
            "/books/:id",
            get(books::get_book_handler)
                .put(books::update_book_handler)
                .delete(books::delete_book_handler),
        )
        .route("/etl/run", post(etl::run_etl_handler))
        .route("/etl/last-run", get(etl::last_run_handler))
        .with_state(app_state)
}
