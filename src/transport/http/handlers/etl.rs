use crate::app::pipeline::{RunOutcome, RunReport};
use crate::transport::http::handlers::common::failure;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/etl/run",
    responses(
        (status = 200, description = "Run finished (check `outcome`)", body = RunReport),
        (status = 409, description = "A run is already in flight", body = RunReport)
    )
)]
pub async fn run_etl_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.scheduler.run_exclusive().await;
    let status = match report.outcome {
        RunOutcome::Skipped => StatusCode::CONFLICT,
        RunOutcome::Completed | RunOutcome::SourceUnavailable => StatusCode::OK,
    };
    (status, Json(report)).into_response()
}

#[utoipa::path(
    get,
    path = "/etl/last-run",
    responses(
        (status = 200, description = "Most recent finished run", body = RunReport),
        (status = 404, description = "No run has finished yet", body = ApiResponse)
    )
)]
pub async fn last_run_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.scheduler.last_report().await {
        Some(report) => (StatusCode::OK, Json(report)).into_response(),
        None => failure(StatusCode::NOT_FOUND, "No ETL run has finished yet").into_response(),
    }
}
