//! Published log of past predictions
//!
//! The log is a CSV document that must carry `Timestamp` and
//! `Predicted Power Output (kW)` columns. Rows come back oldest first with
//! `Timestamp` as the leading column.

use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{parse_wall_clock, PREDICTION_COLUMN, TIMESTAMP_COLUMN};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::coerce_numeric;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub timestamp: NaiveDateTime,
    pub predicted_power_kw: Option<f64>,
    /// Cells of the non-timestamp columns, in [`PredictionHistory::columns`] order
    pub cells: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionHistory {
    /// `Timestamp` first, then the remaining columns in file order
    pub columns: Vec<String>,
    pub rows: Vec<HistoryRow>,
}

/// A row rendered as a column-ordered object
struct RowView<'a> {
    columns: &'a [String],
    row: &'a HistoryRow,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        map.serialize_entry(TIMESTAMP_COLUMN, &self.row.timestamp)?;
        for (column, cell) in self.columns.iter().skip(1).zip(&self.row.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

impl Serialize for PredictionHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.iter().map(|row| RowView {
            columns: &self.columns,
            row,
        }))
    }
}

fn cell_value(raw: &str) -> Value {
    let as_string = Value::String(raw.to_string());
    match coerce_numeric(&as_string) {
        Some(n) => serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(as_string),
        None if raw.is_empty() => Value::Null,
        None => as_string,
    }
}

pub fn parse_history(text: &str) -> PipelineResult<PredictionHistory> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let ts_idx = headers.iter().position(|h| h == TIMESTAMP_COLUMN);
    let power_idx = headers.iter().position(|h| h == PREDICTION_COLUMN);
    let (Some(ts_idx), Some(_)) = (ts_idx, power_idx) else {
        return Err(PipelineError::DataFormat(format!(
            "prediction history must contain '{}' and '{}' columns",
            TIMESTAMP_COLUMN, PREDICTION_COLUMN
        )));
    };

    let other: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != ts_idx)
        .map(|(idx, h)| (idx, h.to_string()))
        .collect();

    let mut columns = vec![TIMESTAMP_COLUMN.to_string()];
    columns.extend(other.iter().map(|(_, h)| h.clone()));

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let Some(timestamp) = record.get(ts_idx).and_then(parse_wall_clock) else {
            dropped += 1;
            continue;
        };

        let cells: Vec<Value> = other
            .iter()
            .map(|(idx, _)| cell_value(record.get(*idx).unwrap_or_default()))
            .collect();
        let predicted_power_kw = other
            .iter()
            .position(|(_, h)| h == PREDICTION_COLUMN)
            .and_then(|pos| cells[pos].as_f64());

        rows.push(HistoryRow {
            timestamp,
            predicted_power_kw,
            cells,
        });
    }

    if dropped > 0 {
        warn!(dropped, "dropped history rows with unparseable timestamps");
    }

    rows.sort_by_key(|row| row.timestamp);
    Ok(PredictionHistory { columns, rows })
}

pub struct HistoryClient {
    client: Client,
    url: String,
}

impl HistoryClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub async fn fetch(&self) -> PipelineResult<PredictionHistory> {
        debug!(url = %self.url, "fetching prediction history");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            PipelineError::UpstreamUnavailable(format!("history request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::UpstreamUnavailable(format!(
                "history source returned {}",
                status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;
        parse_history(&text)
    }
}
