//! ML Model Definitions

use super::{FeatureVector, ModelMetadata, ModelType};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A trained regression model: one feature row in, one value out.
///
/// Implementations are read-only after load and must be safe to call from
/// concurrent requests.
#[cfg_attr(test, mockall::automock)]
pub trait RegressionModel: Send + Sync {
    /// Predict a value from a single feature row
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;
}

/// Check that a row matches the model's declared shape
pub(crate) fn check_shape(metadata: &ModelMetadata, features: &FeatureVector) -> Result<()> {
    if features.len() != metadata.feature_names.len() {
        anyhow::bail!(
            "Feature count mismatch: expected {}, got {}",
            metadata.feature_names.len(),
            features.len()
        );
    }
    if features.feature_names != metadata.feature_names {
        anyhow::bail!("Feature names do not match the model's declared order");
    }
    Ok(())
}

/// Simple Linear Regression Model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub metadata: ModelMetadata,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, metadata: ModelMetadata) -> Result<Self> {
        if coefficients.len() != metadata.feature_names.len() {
            anyhow::bail!(
                "Model declares {} features but has {} coefficients",
                metadata.feature_names.len(),
                coefficients.len()
            );
        }
        Ok(Self {
            metadata,
            coefficients,
            intercept,
        })
    }

    /// Create a model with uniform coefficients over the given features
    pub fn uniform(feature_names: Vec<String>, coefficient: f64, intercept: f64) -> Self {
        let metadata = ModelMetadata {
            model_id: "uniform_linear".to_string(),
            model_type: ModelType::LinearRegression,
            version: None,
            trained_at: None,
            feature_names,
        };

        Self {
            coefficients: vec![coefficient; metadata.feature_names.len()],
            metadata,
            intercept,
        }
    }
}

impl RegressionModel for LinearRegressionModel {
    /// Missing (`NaN`) features contribute nothing to the sum.
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        check_shape(&self.metadata, features)?;

        let prediction: f64 = features
            .features
            .iter()
            .zip(self.coefficients.iter())
            .filter(|(f, _)| !f.is_nan())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept;

        Ok(prediction)
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
