//! Provider column labels to canonical feature names

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::domain::{WeatherRow, WeatherTable};

static CANONICAL_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("temperature (degC)", "temperature_degC"),
        ("dewpoint_temperature (degC)", "dewpoint_temperature_degC"),
        ("relative_humidity (0-1)", "relative_humidity"),
        ("wind_speed (m/s)", "wind_speed_mps"),
        ("wind_direction (deg)", "wind_direction_deg"),
        ("total_cloud_cover (0-1)", "total_cloud_cover"),
    ])
});

/// Canonical name for a provider label; unknown labels pass through
pub fn canonical_name(label: &str) -> &str {
    CANONICAL_NAMES.get(label).copied().unwrap_or(label)
}

/// Rename every column of a forecast table
pub fn normalize(table: WeatherTable) -> WeatherTable {
    let columns = table
        .columns
        .iter()
        .map(|c| canonical_name(c).to_string())
        .collect();

    let rows = table
        .rows
        .into_iter()
        .map(|row| WeatherRow {
            timestamp: row.timestamp,
            values: row
                .values
                .into_iter()
                .map(|(k, v)| (canonical_name(&k).to_string(), v))
                .collect(),
        })
        .collect();

    WeatherTable { columns, rows }
}
