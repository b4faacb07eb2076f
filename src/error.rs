//! Pipeline error taxonomy
//!
//! Every variant is terminal for a pipeline run: nothing is retried and no
//! partial prediction sequence is returned alongside an error.

use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Forecast source unreachable or answered with a non-success status
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Forecast payload could not be decoded
    #[error("Response parse error: {0}")]
    ResponseParse(String),

    /// Local tabular input is unreadable or lacks required columns
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Merged data lacks features the model requires
    #[error("Missing features for prediction: [{}]", .missing.iter().join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// Model invocation failed
    #[error("Prediction error: {0}")]
    Prediction(String),
}

impl PipelineError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            PipelineError::ResponseParse(_) => "ResponseParse",
            PipelineError::DataFormat(_) => "DataFormat",
            PipelineError::SchemaMismatch { .. } => "SchemaMismatch",
            PipelineError::Prediction(_) => "Prediction",
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::DataFormat(e.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_names_features() {
        let err = PipelineError::SchemaMismatch {
            missing: vec!["GHI".to_string(), "wind_speed_mps".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing features for prediction: [GHI, wind_speed_mps]"
        );
        assert_eq!(err.kind(), "SchemaMismatch");
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::UpstreamUnavailable("status 503".to_string());
        assert_eq!(err.to_string(), "Upstream unavailable: status 503");
    }
}
