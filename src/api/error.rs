use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::PipelineError;

/// Errors returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Pipeline(e) => match e {
                PipelineError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::ResponseParse(_) => StatusCode::BAD_GATEWAY,
                PipelineError::DataFormat(_)
                | PipelineError::SchemaMismatch { .. }
                | PipelineError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::Pipeline(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.error_type(), "request failed");
        } else {
            tracing::debug!(error = %self, "client error");
        }

        let body = ErrorResponse {
            success: false,
            error: self.error_type().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_status_codes() {
        let cases = [
            (PipelineError::UpstreamUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (PipelineError::ResponseParse("x".into()), StatusCode::BAD_GATEWAY),
            (PipelineError::DataFormat("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                PipelineError::SchemaMismatch { missing: vec!["GHI".into()] },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (PipelineError::Prediction("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_error_types() {
        let not_found = ApiError::NotFound("x".into());
        assert_eq!(not_found.error_type(), "NotFound");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(PipelineError::Prediction("x".into())).error_type(),
            "Prediction"
        );
    }

    #[test]
    fn test_error_display() {
        let error = ApiError::from(PipelineError::SchemaMismatch {
            missing: vec!["GHI".into(), "wind_speed_mps".into()],
        });
        assert_eq!(
            error.to_string(),
            "Missing features for prediction: [GHI, wind_speed_mps]"
        );
    }
}
