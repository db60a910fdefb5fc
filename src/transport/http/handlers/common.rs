use crate::storage::StoreError;
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;

pub const BOOK_NOT_FOUND: &str = "Book not found";

pub fn failure(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
}

pub fn book_not_found() -> (StatusCode, Json<ApiResponse>) {
    failure(StatusCode::NOT_FOUND, BOOK_NOT_FOUND)
}

/// Title collisions are the caller's problem (409); everything else is ours (500).
pub fn store_failure(err: StoreError) -> (StatusCode, Json<ApiResponse>) {
    match err {
        StoreError::DuplicateTitle(_) => failure(StatusCode::CONFLICT, err.to_string()),
        StoreError::Database(_) => {
            error!(error = %err, "store operation failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
