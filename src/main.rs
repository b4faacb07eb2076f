use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cirrus_forecast::{
    api::{self, AppState},
    config::Config,
    forecast::{AtmosphericClient, ForecastFetcher, HistoryClient},
    irradiance::IrradianceLoader,
    ml,
    pipeline::ForecastPipeline,
    telemetry,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    telemetry::init_tracing(&cfg.logging);

    if cfg.forecast.api_key.is_empty() {
        warn!("forecast API key is empty; set CIRRUS__FORECAST__API_KEY");
    }

    let tz = cfg.site.tz()?;

    // Loaded once and shared read-only by every request
    let model = ml::load_model(&cfg.model.path)?;

    let fetcher = ForecastFetcher::from_config(&cfg.forecast, &cfg.site, tz)
        .context("Failed to build forecast client")?;
    let loader = IrradianceLoader::new(&cfg.irradiance.path, tz);
    let pipeline = ForecastPipeline::new(fetcher, loader, model.clone(), cfg.forecast.horizon_hours);

    let atmospheric = AtmosphericClient::from_config(&cfg.atmospheric)
        .context("Failed to build atmospheric forecast client")?;
    let history = HistoryClient::new(
        cfg.history.url.clone(),
        Duration::from_secs(cfg.history.http_timeout_seconds),
    )
    .context("Failed to build history client")?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        atmospheric: Arc::new(atmospheric),
        history: Arc::new(history),
        model,
    };

    let app = api::router(state, &cfg.server);
    let addr = cfg.server.socket_addr()?;

    info!(
        %addr,
        site = cfg.site.name.as_deref().unwrap_or("unnamed"),
        timezone = %tz,
        "starting CIRRUS forecast service"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
