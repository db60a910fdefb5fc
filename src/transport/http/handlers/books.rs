//! CRUD over the `books` collection. Handlers pass straight through to the store;
//! they do not normalize titles the way the pipeline does.

use crate::domain::book::{BookRecord, StoredBook};
use crate::transport::http::handlers::common::{book_not_found, store_failure};
use crate::transport::http::types::{json_422, ApiResponse, AppState, MessageResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

const EXPECTED_BOOK: &str = r#"{"title": "...", "price": "...", "availability": "..."}"#;

#[utoipa::path(
    get,
    path = "/books",
    responses(
        (status = 200, description = "All stored books", body = Vec<StoredBook>),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn list_books_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(books) => (StatusCode::OK, Json(books)).into_response(),
        Err(e) => store_failure(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    params(
        ("id" = String, Path, description = "Book identifier")
    ),
    responses(
        (status = 200, description = "The book", body = StoredBook),
        (status = 404, description = "Book not found", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn get_book_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&id).await {
        Ok(Some(book)) => (StatusCode::OK, Json(book)).into_response(),
        Ok(None) => book_not_found().into_response(),
        Err(e) => store_failure(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/books",
    request_body = BookRecord,
    responses(
        (status = 201, description = "Book created", body = StoredBook),
        (status = 409, description = "A book with this title already exists", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn create_book_handler(
    State(state): State<AppState>,
    request: Result<Json<BookRecord>, JsonRejection>,
) -> impl IntoResponse {
    let Json(record) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, EXPECTED_BOOK).into_response(),
    };

    match state.store.insert(&record).await {
        Ok(book) => (StatusCode::CREATED, Json(book)).into_response(),
        Err(e) => store_failure(e).into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/books/{id}",
    params(
        ("id" = String, Path, description = "Book identifier")
    ),
    request_body = BookRecord,
    responses(
        (status = 200, description = "Book replaced", body = StoredBook),
        (status = 404, description = "Book not found", body = ApiResponse),
        (status = 409, description = "Another book already has this title", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn update_book_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<BookRecord>, JsonRejection>,
) -> impl IntoResponse {
    let Json(record) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, EXPECTED_BOOK).into_response(),
    };

    match state.store.replace(&id, &record).await {
        Ok(Some(book)) => (StatusCode::OK, Json(book)).into_response(),
        Ok(None) => book_not_found().into_response(),
        Err(e) => store_failure(e).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(
        ("id" = String, Path, description = "Book identifier")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn delete_book_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete(&id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Book deleted successfully".to_string(),
            }),
        )
            .into_response(),
        Ok(false) => book_not_found().into_response(),
        Err(e) => store_failure(e).into_response(),
    }
}
