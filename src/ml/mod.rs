//! Machine Learning Module
//!
//! Regression backends that turn a single feature row into one power value.
//!
//! # Architecture
//! - [`models::RegressionModel`] is the narrow seam the prediction engine calls
//! - [`models::LinearRegressionModel`] and [`trees::GradientBoostedTrees`] are
//!   the supported backends
//! - [`artifact`] loads a backend from its JSON artifact once per process

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod artifact;
pub mod models;
pub mod trees;

pub use artifact::{load_model, ModelArtifact};
pub use models::{LinearRegressionModel, RegressionModel};
pub use trees::GradientBoostedTrees;

/// ML Model Type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    LinearRegression,
    GradientBoosting,
}

/// ML Model Metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub model_id: String,
    pub model_type: ModelType,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub trained_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Feature names in the order the model consumes them
    pub feature_names: Vec<String>,
}

/// Feature Vector for ML models
///
/// Missing values are carried as `NaN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }

    /// Build a vector by reading `feature_names` in order through `lookup`
    pub fn from_lookup<F>(feature_names: &[String], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<f64>,
    {
        Self {
            features: feature_names
                .iter()
                .map(|name| lookup(name).unwrap_or(f64::NAN))
                .collect(),
            feature_names: feature_names.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.features[idx])
    }
}
