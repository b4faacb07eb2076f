//! Forecast endpoints
//!
//! Each page of the dashboard maps to one endpoint returning the data the
//! page charts.

use std::time::Instant;

use axum::{extract::State, Json};

use super::{error::ApiError, response::ApiResponse, AppState};
use crate::domain::PredictionRecord;
use crate::forecast::{PredictionHistory, UnitGroup};

/// GET /api/v1/predictions - power forecast for the coming hours
pub async fn get_predictions(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PredictionRecord>>>, ApiError> {
    let started = Instant::now();
    let records = st.pipeline.run_now().await?;
    let count = records.len();
    Ok(Json(
        ApiResponse::success(records)
            .with_count(count)
            .with_duration(started),
    ))
}

/// GET /api/v1/predictions/first - the nearest hour only
pub async fn get_first_prediction(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<PredictionRecord>>, ApiError> {
    let first = st
        .pipeline
        .run_now()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("forecast returned no rows".to_string()))?;
    Ok(Json(ApiResponse::success(first)))
}

/// GET /api/v1/atmospheric - cloud, temperature, wind and pressure series
pub async fn get_atmospheric(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UnitGroup>>>, ApiError> {
    let groups = st.atmospheric.fetch().await?;
    let count = groups.len();
    Ok(Json(ApiResponse::success(groups).with_count(count)))
}

/// GET /api/v1/history - predictions published so far
pub async fn get_history(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<PredictionHistory>>, ApiError> {
    let history = st.history.fetch().await?;
    let count = history.rows.len();
    Ok(Json(ApiResponse::success(history).with_count(count)))
}
