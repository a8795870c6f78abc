//! Signal API endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;
use crate::services::CycleStatus;
use crate::types::{MarketSnapshot, SignalHistory};
use crate::AppState;

/// Create the signal router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_snapshot))
        .route("/history", get(get_history))
        .route("/refresh", post(refresh))
        .route("/clear-error", post(clear_error))
}

/// Latest published snapshot.
async fn get_snapshot(State(state): State<AppState>) -> Json<MarketSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

async fn get_history(State(state): State<AppState>) -> Json<SignalHistory> {
    Json(state.orchestrator.history().await)
}

/// Run a cycle now. A skipped cycle is not an error.
async fn refresh(State(state): State<AppState>) -> Result<Json<CycleStatus>, AppError> {
    let status = state.orchestrator.refresh().await?;
    Ok(Json(status))
}

async fn clear_error(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.clear_error().await;
    StatusCode::NO_CONTENT
}
