use crate::services::GatePhase;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    symbol: String,
    cycle: GatePhase,
    /// Time of the last published snapshot, if any cycle has completed.
    last_update: Option<i64>,
    /// Set while the latest cycle failed.
    degraded: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.orchestrator.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        symbol: state.config.symbol.to_uppercase(),
        cycle: state.orchestrator.phase(),
        last_update: snapshot.updated_at,
        degraded: snapshot.last_error.is_some(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "1.0.0",
            symbol: "BTC".to_string(),
            cycle: GatePhase::Idle,
            last_update: None,
            degraded: false,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
        assert!(json.contains("\"cycle\":\"idle\""));
        assert!(json.contains("\"lastUpdate\":null"));
        assert!(json.contains("\"degraded\":false"));
    }
}
