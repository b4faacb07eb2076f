//! Forecast-to-power pipeline
//!
//! fetch forecast → normalize columns → load irradiance → merge → predict.
//! Each run is independent; the model is the only state shared between runs.

pub mod merge;
pub mod predict;

pub use merge::{coerce_numeric, merge, missing_features};
pub use predict::{finalize, forward_fill, PredictionEngine};

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::{ForecastWindow, PredictionRecord};
use crate::error::PipelineResult;
use crate::forecast::{normalize, ForecastFetcher};
use crate::irradiance::IrradianceLoader;
use crate::ml::RegressionModel;

pub struct ForecastPipeline {
    fetcher: ForecastFetcher,
    loader: IrradianceLoader,
    engine: PredictionEngine,
    horizon_hours: u32,
}

impl ForecastPipeline {
    pub fn new(
        fetcher: ForecastFetcher,
        loader: IrradianceLoader,
        model: Arc<dyn RegressionModel>,
        horizon_hours: u32,
    ) -> Self {
        Self {
            fetcher,
            loader,
            engine: PredictionEngine::new(model),
            horizon_hours,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        self.engine.feature_names()
    }

    /// Run for the window starting at the current hour
    pub async fn run_now(&self) -> PipelineResult<Vec<PredictionRecord>> {
        self.run(&ForecastWindow::from_now(self.horizon_hours)).await
    }

    #[instrument(skip_all, fields(start = %window.start, end = %window.end))]
    pub async fn run(&self, window: &ForecastWindow) -> PipelineResult<Vec<PredictionRecord>> {
        let forecast = normalize(self.fetcher.fetch(window).await?);
        let irradiance = self.loader.load()?;

        let merged = merge(&forecast, &irradiance, self.engine.feature_names())?;
        let records = self.engine.predict(&merged)?;

        info!(records = records.len(), "power forecast ready");
        Ok(records)
    }
}
