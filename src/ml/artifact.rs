//! Model artifact loading
//!
//! An artifact is a JSON document tagged by `model_type`:
//!
//! ```json
//! {
//!   "model_type": "linear_regression",
//!   "model_id": "slemon-park-v3",
//!   "feature_names": ["temperature_degC", "GHI"],
//!   "coefficients": [0.1, 0.02],
//!   "intercept": 0.0
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::models::{LinearRegressionModel, RegressionModel};
use super::trees::{GradientBoostedTrees, RegressionTree};
use super::{ModelMetadata, ModelType};

#[derive(Debug, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearRegression {
        model_id: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        trained_at: Option<chrono::DateTime<chrono::Utc>>,
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        #[serde(default)]
        intercept: f64,
    },
    GradientBoosting {
        model_id: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        trained_at: Option<chrono::DateTime<chrono::Utc>>,
        feature_names: Vec<String>,
        #[serde(default)]
        base_score: f64,
        trees: Vec<RegressionTree>,
    },
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse model artifact")
    }

    /// Validate and turn the artifact into a shareable model
    pub fn into_model(self) -> Result<Arc<dyn RegressionModel>> {
        match self {
            ModelArtifact::LinearRegression {
                model_id,
                version,
                trained_at,
                feature_names,
                coefficients,
                intercept,
            } => {
                let metadata = ModelMetadata {
                    model_id,
                    model_type: ModelType::LinearRegression,
                    version,
                    trained_at,
                    feature_names,
                };
                Ok(Arc::new(LinearRegressionModel::new(
                    coefficients,
                    intercept,
                    metadata,
                )?))
            }
            ModelArtifact::GradientBoosting {
                model_id,
                version,
                trained_at,
                feature_names,
                base_score,
                trees,
            } => {
                let metadata = ModelMetadata {
                    model_id,
                    model_type: ModelType::GradientBoosting,
                    version,
                    trained_at,
                    feature_names,
                };
                Ok(Arc::new(GradientBoostedTrees::new(metadata, base_score, trees)?))
            }
        }
    }
}

/// Load the model artifact at `path`
pub fn load_model(path: impl AsRef<Path>) -> Result<Arc<dyn RegressionModel>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact at {}", path.display()))?;

    let model = ModelArtifact::from_json(&json)
        .and_then(ModelArtifact::into_model)
        .with_context(|| format!("Invalid model artifact at {}", path.display()))?;

    let metadata = model.metadata();
    info!(
        model_id = %metadata.model_id,
        model_type = ?metadata.model_type,
        features = metadata.feature_names.len(),
        "loaded model artifact"
    );

    Ok(model)
}
