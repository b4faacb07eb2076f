//! Atmospheric forecast (cloud layers, pressure, wind) from a CSV point
//! forecast, grouped by unit so variables sharing an axis chart together.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use super::weather::GeoLocation;
use crate::config::AtmosphericConfig;
use crate::domain::parse_wall_clock;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::coerce_numeric;

pub const DATETIME_COLUMN: &str = "DATETIME";

/// Human-readable label per provider variable
pub const VARIABLE_LABELS: [(&str, &str); 17] = [
    ("TMP", "Temperature (°C)"),
    ("DP", "Dew Point (°C)"),
    ("RH", "Relative Humidity (%)"),
    ("WSPD", "Wind Speed (km/h)"),
    ("GUST", "Wind Gust (km/h)"),
    ("WDIR", "Wind Direction (°)"),
    ("PRECIP_ttl", "Precipitation Total (mm)"),
    ("PRECIP_int", "Precipitation Intensity (mm/hr)"),
    ("CLOUD", "Total Cloud Cover (%)"),
    ("LCDC", "Low Cloud Cover (%)"),
    ("MCDC", "Mid Cloud Cover (%)"),
    ("HCDC", "High Cloud Cover (%)"),
    ("SLP", "Sea Level Pressure (hPa)"),
    ("DSWRF", "Downward Shortwave Radiation (W/m²)"),
    ("CAPE", "CAPE (J/kg)"),
    ("CIN", "CIN (J/kg)"),
    ("PWAT", "Precipitable Water (mm)"),
];

/// Variables sharing a unit, in display order
pub const UNIT_GROUPS: [(&str, &[&str]); 6] = [
    ("Cloud Cover (%)", &["CLOUD", "LCDC", "MCDC", "HCDC"]),
    ("Temperature (°C)", &["TMP", "DP"]),
    ("Relative Humidity (%)", &["RH"]),
    ("Wind Speed (km/h)", &["WSPD", "GUST"]),
    ("Wind Direction (°)", &["WDIR"]),
    ("Pressure (hPa)", &["SLP"]),
];

pub fn variable_label(variable: &str) -> &str {
    VARIABLE_LABELS
        .iter()
        .find(|(name, _)| *name == variable)
        .map(|(_, label)| *label)
        .unwrap_or(variable)
}

/// Parsed CSV forecast: one timestamp column plus numeric series
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtmosphericTable {
    pub timestamps: Vec<Option<NaiveDateTime>>,
    pub series: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: Option<NaiveDateTime>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub variable: String,
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitGroup {
    pub unit: String,
    pub series: Vec<Series>,
}

pub fn parse_csv(text: &str) -> PipelineResult<AtmosphericTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::ResponseParse(format!("invalid forecast CSV: {}", e)))?
        .clone();

    let dt_idx = headers
        .iter()
        .position(|h| h == DATETIME_COLUMN)
        .ok_or_else(|| {
            PipelineError::ResponseParse(format!("forecast CSV has no {} column", DATETIME_COLUMN))
        })?;

    let mut table = AtmosphericTable::default();
    for record in reader.records() {
        let record = record
            .map_err(|e| PipelineError::ResponseParse(format!("invalid forecast CSV: {}", e)))?;

        table
            .timestamps
            .push(record.get(dt_idx).and_then(parse_wall_clock));

        for (idx, header) in headers.iter().enumerate() {
            if idx == dt_idx {
                continue;
            }
            let value = record
                .get(idx)
                .and_then(|cell| coerce_numeric(&serde_json::Value::String(cell.to_string())));
            table
                .series
                .entry(header.to_string())
                .or_default()
                .push(value);
        }
    }

    Ok(table)
}

/// Group available variables by unit; groups with nothing to show are omitted
pub fn group_by_unit(table: &AtmosphericTable) -> Vec<UnitGroup> {
    UNIT_GROUPS
        .iter()
        .filter_map(|(unit, variables)| {
            let series: Vec<Series> = variables
                .iter()
                .filter_map(|variable| {
                    let values = table.series.get(*variable)?;
                    Some(Series {
                        variable: variable.to_string(),
                        label: variable_label(variable).to_string(),
                        points: table
                            .timestamps
                            .iter()
                            .zip(values)
                            .map(|(timestamp, value)| SeriesPoint {
                                timestamp: *timestamp,
                                value: *value,
                            })
                            .collect(),
                    })
                })
                .collect();

            (!series.is_empty()).then(|| UnitGroup {
                unit: unit.to_string(),
                series,
            })
        })
        .collect()
}

pub struct AtmosphericClient {
    client: Client,
    base_url: String,
    api_key: String,
    source_model: String,
    location: GeoLocation,
}

impl AtmosphericClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        source_model: impl Into<String>,
        location: GeoLocation,
        timeout: Duration,
    ) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            source_model: source_model.into(),
            location,
        })
    }

    pub fn from_config(cfg: &AtmosphericConfig) -> PipelineResult<Self> {
        Self::new(
            cfg.base_url.clone(),
            cfg.api_key.clone(),
            cfg.source_model.clone(),
            GeoLocation {
                latitude: cfg.latitude,
                longitude: cfg.longitude,
                name: None,
            },
            Duration::from_secs(cfg.http_timeout_seconds),
        )
    }

    pub async fn fetch(&self) -> PipelineResult<Vec<UnitGroup>> {
        debug!(url = %self.base_url, model = %self.source_model, "fetching atmospheric forecast");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.clone()),
                ("lat", self.location.latitude.to_string()),
                ("lon", self.location.longitude.to_string()),
                ("model", self.source_model.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                PipelineError::UpstreamUnavailable(format!("atmospheric request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "atmospheric forecast API returned error status");
            return Err(PipelineError::UpstreamUnavailable(format!(
                "atmospheric forecast API returned {}",
                status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;

        let table = parse_csv(&text)?;
        let groups = group_by_unit(&table);
        info!(
            rows = table.timestamps.len(),
            groups = groups.len(),
            "fetched atmospheric forecast"
        );
        Ok(groups)
    }
}
