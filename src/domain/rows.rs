use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::time::TimePoint;

/// Column holding global horizontal irradiance
pub const GHI_COLUMN: &str = "GHI";

/// Label of the prediction column in produced records
pub const PREDICTION_COLUMN: &str = "Predicted Power Output (kW)";

/// Label of the timestamp column in produced records
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// One forecast time step, keyed by column label
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRow {
    pub timestamp: TimePoint,
    pub values: BTreeMap<String, Value>,
}

/// Forecast rows plus the column order reported by the provider
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherTable {
    pub columns: Vec<String>,
    pub rows: Vec<WeatherRow>,
}

impl WeatherTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One irradiance record with its raw, not yet coerced, GHI cell
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceRow {
    pub timestamp: TimePoint,
    pub ghi: Value,
}

/// A forecast row joined with irradiance, numeric feature values only
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub timestamp: TimePoint,
    pub values: BTreeMap<String, Option<f64>>,
}

impl MergedRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub fn ghi(&self) -> Option<f64> {
        self.get(GHI_COLUMN)
    }
}

/// Merge output: columns are the forecast columns followed by `GHI`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedTable {
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row of the produced forecast: timestamp, prediction, then the model
/// features in model order
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub timestamp: TimePoint,
    pub predicted_power_kw: f64,
    pub features: Vec<(String, Option<f64>)>,
}

impl Serialize for PredictionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.features.len() + 2))?;
        map.serialize_entry(TIMESTAMP_COLUMN, &self.timestamp.to_rfc3339())?;
        map.serialize_entry(PREDICTION_COLUMN, &self.predicted_power_kw)?;
        for (name, value) in &self.features {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
