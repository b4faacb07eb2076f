//! CIRRUS: hourly solar power forecasts for a single site.
//!
//! A remote weather forecast is merged with local irradiance records and fed,
//! row by row, to a pre-trained regression model. The resulting sequence of
//! `(Timestamp, Predicted Power Output (kW), features...)` records is served
//! over HTTP for whatever front end charts it.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod irradiance;
pub mod ml;
pub mod pipeline;
pub mod telemetry;

pub use error::{PipelineError, PipelineResult};
