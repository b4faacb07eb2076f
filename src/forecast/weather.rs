//! Weather forecast integration
//!
//! Requests an hourly point forecast for the configured site and turns the
//! provider's columnar JSON payload into a [`WeatherTable`] in local time.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, EnumIter, IntoEnumIterator};
use tracing::{debug, error, info};

use crate::config::{ForecastConfig, SiteConfig};
use crate::domain::{from_epoch_fractional, ForecastWindow, WeatherRow, WeatherTable};
use crate::error::{PipelineError, PipelineResult};

/// Longest slice of an error body carried into error messages
const MAX_ERROR_BODY: usize = 512;

/// Forecast variables requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ForecastVariable {
    Temperature,
    DewpointTemperature,
    RelativeHumidity,
    TotalCloudCover,
    WindSpeed,
    WindDirection,
}

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

/// Client for the point forecast API
pub struct ForecastFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    source_model: String,
    location: GeoLocation,
    tz: Tz,
}

impl ForecastFetcher {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        source_model: impl Into<String>,
        location: GeoLocation,
        tz: Tz,
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
            tz,
        })
    }

    pub fn from_config(forecast: &ForecastConfig, site: &SiteConfig, tz: Tz) -> PipelineResult<Self> {
        Self::new(
            forecast.base_url.clone(),
            forecast.api_key.clone(),
            forecast.source_model.clone(),
            site.location(),
            tz,
            Duration::from_secs(forecast.http_timeout_seconds),
        )
    }

    fn query(&self, window: &ForecastWindow) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = ForecastVariable::iter()
            .map(|v| ("param", v.as_ref().to_string()))
            .collect();
        query.extend([
            ("lat", self.location.latitude.to_string()),
            ("lon", self.location.longitude.to_string()),
            ("model", self.source_model.clone()),
            ("start", window.start_param()),
            ("end", window.end_param()),
            ("freq", "H".to_string()),
            ("format", "json".to_string()),
        ]);
        query
    }

    /// Fetch the forecast for `window`
    pub async fn fetch(&self, window: &ForecastWindow) -> PipelineResult<WeatherTable> {
        debug!(
            url = %self.base_url,
            start = %window.start_param(),
            end = %window.end_param(),
            "fetching weather forecast"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query(window))
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "forecast request failed");
                PipelineError::UpstreamUnavailable(format!("forecast request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "forecast API returned error status");
            return Err(PipelineError::UpstreamUnavailable(format!(
                "forecast API returned {}: {}",
                status,
                truncate(&body, MAX_ERROR_BODY)
            )));
        }

        let body = response.text().await.map_err(|e| {
            PipelineError::UpstreamUnavailable(format!("failed to read forecast body: {}", e))
        })?;

        let table = parse_payload(&body, self.tz)?;

        info!(
            rows = table.len(),
            latitude = self.location.latitude,
            longitude = self.location.longitude,
            "fetched weather forecast"
        );

        Ok(table)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct Envelope {
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ColumnarDocument {
    columns: Vec<String>,
    /// Epoch seconds, integral or fractional
    index: Vec<f64>,
    data: Vec<Vec<Value>>,
}

/// Decode the envelope and its embedded columnar document
pub fn parse_payload(body: &str, tz: Tz) -> PipelineResult<WeatherTable> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| PipelineError::ResponseParse(format!("invalid envelope: {}", e)))?;

    let document: ColumnarDocument = match envelope.data {
        Value::String(embedded) => serde_json::from_str(&embedded),
        other => serde_json::from_value(other),
    }
    .map_err(|e| PipelineError::ResponseParse(format!("invalid embedded document: {}", e)))?;

    if document.index.len() != document.data.len() {
        return Err(PipelineError::ResponseParse(format!(
            "index has {} entries but data has {} rows",
            document.index.len(),
            document.data.len()
        )));
    }

    let mut rows = Vec::with_capacity(document.data.len());
    for (pos, (epoch, cells)) in document.index.iter().zip(document.data).enumerate() {
        if cells.len() != document.columns.len() {
            return Err(PipelineError::ResponseParse(format!(
                "row {} has {} values for {} columns",
                pos,
                cells.len(),
                document.columns.len()
            )));
        }

        let timestamp = from_epoch_fractional(*epoch, tz).ok_or_else(|| {
            PipelineError::ResponseParse(format!("index value {} is out of range", epoch))
        })?;

        let values: BTreeMap<String, Value> =
            document.columns.iter().cloned().zip(cells).collect();

        rows.push(WeatherRow { timestamp, values });
    }

    Ok(WeatherTable {
        columns: document.columns,
        rows,
    })
}
