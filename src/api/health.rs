use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::ml::ModelType;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    model: ModelHealth,
}

#[derive(Debug, Serialize)]
pub struct ModelHealth {
    model_id: String,
    model_type: ModelType,
    feature_names: Vec<String>,
}

/// GET /health
///
/// The model is loaded before the server binds, so a responding process is
/// always able to predict; upstream sources are checked per request.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let metadata = state.model.metadata();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
        model: ModelHealth {
            model_id: metadata.model_id.clone(),
            model_type: metadata.model_type,
            feature_names: metadata.feature_names.clone(),
        },
    })
}
