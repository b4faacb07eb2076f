//! Irradiance records from a local CSV file
//!
//! The file carries a `timestamp` column (`YYYY-MM-DD HH:MM`, local wall-clock
//! time) and a `GHI` column. Other columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{localize, IrradianceRow, GHI_COLUMN};
use crate::error::{PipelineError, PipelineResult};

pub const TIMESTAMP_HEADER: &str = "timestamp";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct IrradianceLoader {
    path: PathBuf,
    tz: Tz,
}

impl IrradianceLoader {
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            path: path.into(),
            tz,
        }
    }

    /// Read the configured file
    pub fn load(&self) -> PipelineResult<Vec<IrradianceRow>> {
        let file = File::open(&self.path).map_err(|e| {
            PipelineError::DataFormat(format!(
                "cannot open irradiance file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let rows = self.read_from(file)?;
        debug!(
            path = %self.path.display(),
            rows = rows.len(),
            "loaded irradiance records"
        );
        Ok(rows)
    }

    /// Parse irradiance records from any CSV source
    pub fn read_from<R: Read>(&self, reader: R) -> PipelineResult<Vec<IrradianceRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let ts_idx = headers.iter().position(|h| h == TIMESTAMP_HEADER);
        let ghi_idx = headers.iter().position(|h| h == GHI_COLUMN);

        let (ts_idx, ghi_idx) = match (ts_idx, ghi_idx) {
            (Some(t), Some(g)) => (t, g),
            _ => {
                let missing: Vec<&str> = [
                    (TIMESTAMP_HEADER, ts_idx.is_none()),
                    (GHI_COLUMN, ghi_idx.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                return Err(PipelineError::DataFormat(format!(
                    "irradiance table is missing required columns: {}",
                    missing.join(", ")
                )));
            }
        };

        let mut rows = Vec::new();
        let mut dropped = 0usize;

        for record in csv_reader.records() {
            let record = record?;
            let raw_ts = record.get(ts_idx).unwrap_or_default();

            let timestamp = NaiveDateTime::parse_from_str(raw_ts, TIMESTAMP_FORMAT)
                .ok()
                .and_then(|naive| localize(naive, self.tz));

            let Some(timestamp) = timestamp else {
                dropped += 1;
                continue;
            };

            let ghi = match record.get(ghi_idx) {
                Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                _ => Value::Null,
            };

            rows.push(IrradianceRow { timestamp, ghi });
        }

        if dropped > 0 {
            warn!(dropped, "dropped irradiance rows with invalid or ambiguous timestamps");
        }

        Ok(rows)
    }
}
