pub mod error;
pub mod forecast;
pub mod health;
pub mod response;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    forecast::{AtmosphericClient, HistoryClient},
    ml::RegressionModel,
    pipeline::ForecastPipeline,
};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ForecastPipeline>,
    pub atmospheric: Arc<AtmosphericClient>,
    pub history: Arc<HistoryClient>,
    pub model: Arc<dyn RegressionModel>,
}

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let v1 = Router::new()
        .route("/predictions", get(forecast::get_predictions))
        .route("/predictions/first", get(forecast::get_first_prediction))
        .route("/atmospheric", get(forecast::get_atmospheric))
        .route("/history", get(forecast::get_history));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", v1)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(server.request_timeout_secs),
                )),
        )
        .layer(TraceLayer::new_for_http())
}
