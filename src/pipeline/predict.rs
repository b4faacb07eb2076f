//! Row-by-row power prediction
//!
//! Gaps are forward-filled per column before any row reaches the model. A
//! row whose GHI is exactly zero predicts 0.0 whatever the model says, and
//! every prediction is clipped to be non-negative. One model failure aborts
//! the whole batch.

use std::sync::Arc;

use tracing::{debug, error};

use crate::domain::{MergedRow, MergedTable, PredictionRecord};
use crate::error::{PipelineError, PipelineResult};
use crate::ml::{FeatureVector, RegressionModel};

/// Carry the last known value of each column into later gaps.
///
/// Gaps before the first known value stay missing.
pub fn forward_fill(rows: &[MergedRow]) -> Vec<MergedRow> {
    let mut last_known: std::collections::BTreeMap<String, f64> = Default::default();

    rows.iter()
        .map(|row| {
            let mut filled = row.clone();
            for (column, value) in filled.values.iter_mut() {
                match value {
                    Some(v) => {
                        last_known.insert(column.clone(), *v);
                    }
                    None => *value = last_known.get(column).copied(),
                }
            }
            filled
        })
        .collect()
}

/// Zero-irradiance override, then a non-negative floor
pub fn finalize(raw: f64, ghi: Option<f64>) -> f64 {
    if ghi == Some(0.0) {
        return 0.0;
    }
    // NaN.max(0.0) is 0.0
    raw.max(0.0)
}

pub struct PredictionEngine {
    model: Arc<dyn RegressionModel>,
}

impl PredictionEngine {
    pub fn new(model: Arc<dyn RegressionModel>) -> Self {
        Self { model }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.model.metadata().feature_names
    }

    /// One record per merged row, in input order
    pub fn predict(&self, table: &MergedTable) -> PipelineResult<Vec<PredictionRecord>> {
        let feature_names = self.feature_names();
        let filled = forward_fill(&table.rows);

        let mut records = Vec::with_capacity(filled.len());
        for (idx, row) in filled.into_iter().enumerate() {
            let vector = FeatureVector::from_lookup(feature_names, |name| row.get(name));

            let raw = self.model.predict(&vector).map_err(|e| {
                error!(row = idx, error = %e, "model invocation failed");
                PipelineError::Prediction(format!("row {} ({}): {}", idx, row.timestamp, e))
            })?;

            let predicted_power_kw = finalize(raw, row.ghi());

            records.push(PredictionRecord {
                timestamp: row.timestamp,
                predicted_power_kw,
                features: feature_names
                    .iter()
                    .map(|name| (name.clone(), row.get(name)))
                    .collect(),
            });
        }

        debug!(
            model_id = %self.model.metadata().model_id,
            rows = records.len(),
            "predicted power output"
        );

        Ok(records)
    }
}
