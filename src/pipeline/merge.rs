//! Forecast and irradiance join
//!
//! A left outer join on exact timestamp equality. Every forecast timestamp
//! yields exactly one merged row; irradiance rows with no forecast
//! counterpart are dropped. Only declared model features and `GHI` survive
//! into the merged rows, coerced to numbers.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{IrradianceRow, MergedRow, MergedTable, TimePoint, WeatherTable, GHI_COLUMN};
use crate::error::{PipelineError, PipelineResult};

/// Lenient numeric coercion: anything that is not a finite number, or a
/// string holding one, becomes missing.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Declared features the merged columns cannot supply, in model order
pub fn missing_features(columns: &[String], expected_features: &[String]) -> Vec<String> {
    expected_features
        .iter()
        .filter(|f| !columns.contains(*f))
        .cloned()
        .collect()
}

pub fn merge(
    weather: &WeatherTable,
    irradiance: &[IrradianceRow],
    expected_features: &[String],
) -> PipelineResult<MergedTable> {
    let mut columns: Vec<String> = weather
        .columns
        .iter()
        .filter(|c| c.as_str() != GHI_COLUMN)
        .cloned()
        .collect();
    columns.push(GHI_COLUMN.to_string());

    let missing = missing_features(&columns, expected_features);
    if !missing.is_empty() {
        warn!(?missing, ?columns, "merged data lacks model features");
        return Err(PipelineError::SchemaMismatch { missing });
    }

    // First record wins when the irradiance file repeats a timestamp
    let mut ghi_by_time: HashMap<&TimePoint, &Value> = HashMap::with_capacity(irradiance.len());
    for row in irradiance {
        ghi_by_time.entry(&row.timestamp).or_insert(&row.ghi);
    }

    let numeric_columns: Vec<&String> = columns
        .iter()
        .filter(|c| c.as_str() == GHI_COLUMN || expected_features.contains(*c))
        .collect();

    let mut seen: HashSet<&TimePoint> = HashSet::with_capacity(weather.len());
    let mut rows = Vec::with_capacity(weather.len());
    let mut unmatched = 0usize;

    for row in &weather.rows {
        if !seen.insert(&row.timestamp) {
            debug!(timestamp = %row.timestamp, "skipping repeated forecast timestamp");
            continue;
        }

        let ghi = ghi_by_time.get(&row.timestamp).copied();
        if ghi.is_none() {
            unmatched += 1;
        }

        let values: BTreeMap<String, Option<f64>> = numeric_columns
            .iter()
            .map(|column| {
                let value = if column.as_str() == GHI_COLUMN {
                    ghi.and_then(coerce_numeric)
                } else {
                    row.values.get(column.as_str()).and_then(coerce_numeric)
                };
                ((*column).clone(), value)
            })
            .collect();

        rows.push(MergedRow {
            timestamp: row.timestamp,
            values,
        });
    }

    debug!(
        rows = rows.len(),
        unmatched_irradiance = unmatched,
        "merged forecast with irradiance"
    );

    Ok(MergedTable { columns, rows })
}
