//! HTTP surface tests, driven through the router without binding a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use cirrus_forecast::{
    api::{self, AppState},
    config::ServerConfig,
    forecast::{AtmosphericClient, ForecastFetcher, GeoLocation, HistoryClient},
    irradiance::IrradianceLoader,
    ml,
    pipeline::ForecastPipeline,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn site() -> GeoLocation {
    GeoLocation {
        latitude: 46.2382,
        longitude: -63.1311,
        name: Some("Charlottetown".to_string()),
    }
}

fn app(server: &MockServer) -> Router {
    let timeout = Duration::from_secs(5);
    let model = ml::load_model(fixture("model.json")).unwrap();

    let fetcher = ForecastFetcher::new(
        format!("{}/forecast", server.uri()),
        "test-key",
        "HRRR",
        site(),
        chrono_tz::UTC,
        timeout,
    )
    .unwrap();
    let loader = IrradianceLoader::new(fixture("solar.csv"), chrono_tz::UTC);
    let pipeline = ForecastPipeline::new(fetcher, loader, model.clone(), 24);

    let atmospheric = AtmosphericClient::new(
        format!("{}/spotwx", server.uri()),
        "spot-key",
        "gfs",
        site(),
        timeout,
    )
    .unwrap();
    let history = HistoryClient::new(format!("{}/history.csv", server.uri()), timeout).unwrap();

    let state = AppState {
        pipeline: Arc::new(pipeline),
        atmospheric: Arc::new(atmospheric),
        history: Arc::new(history),
        model,
    };

    let cfg = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 10,
    };
    api::router(state, &cfg)
}

/// Forecast envelope with hourly rows from 2025-01-01T00:00Z
fn forecast_body(temperatures: &[f64]) -> Value {
    let index: Vec<i64> = (0..temperatures.len() as i64)
        .map(|h| 1_735_689_600 + h * 3600)
        .collect();
    let data: Vec<Value> = temperatures
        .iter()
        .map(|t| json!([t, t - 3.0, 0.8, 3.0, 270, 0.5]))
        .collect();
    let doc = json!({
        "columns": [
            "temperature (degC)",
            "dewpoint_temperature (degC)",
            "relative_humidity (0-1)",
            "wind_speed (m/s)",
            "wind_direction (deg)",
            "total_cloud_cover (0-1)"
        ],
        "index": index,
        "data": data,
    });
    json!({ "data": doc.to_string() })
}

async fn mount_forecast(server: &MockServer, temperatures: &[f64]) {
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(temperatures)))
        .mount(server)
        .await;
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_model() {
    let server = MockServer::start().await;
    let (status, body) = get_json(app(&server), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"]["model_type"], "linear_regression");
    assert_eq!(body["model"]["feature_names"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_predictions_upstream_outage_is_503() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = get_json(app(&server), "/api/v1/predictions").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UpstreamUnavailable");
}

#[tokio::test]
async fn test_predictions_returns_full_sequence() {
    let server = MockServer::start().await;
    mount_forecast(&server, &[-5.0, -2.0, -1.0]).await;

    let (status, body) = get_json(app(&server), "/api/v1/predictions").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["metadata"]["record_count"], 3);

    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["Timestamp"], "2025-01-01T00:00:00+00:00");
    assert_eq!(records[0]["Predicted Power Output (kW)"], 0.0);
    // -2 + 0.5 * 250 - 10
    assert_eq!(records[1]["Predicted Power Output (kW)"], 113.0);
    // GHI carried forward from 01:00
    assert_eq!(records[2]["GHI"], 250.0);
    assert_eq!(records[2]["Predicted Power Output (kW)"], 114.0);
}

#[tokio::test]
async fn test_first_prediction_returns_nearest_hour() {
    let server = MockServer::start().await;
    mount_forecast(&server, &[-2.0, -1.0]).await;

    let (status, body) = get_json(app(&server), "/api/v1/predictions/first").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Timestamp"], "2025-01-01T00:00:00+00:00");
    assert_eq!(body["data"]["Predicted Power Output (kW)"], 0.0);
    assert_eq!(body["data"]["temperature_degC"], -2.0);
}

#[tokio::test]
async fn test_first_prediction_of_empty_forecast_is_404() {
    let server = MockServer::start().await;
    mount_forecast(&server, &[]).await;

    let (status, body) = get_json(app(&server), "/api/v1/predictions/first").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_history_is_sorted_with_timestamp_first() {
    let server = MockServer::start().await;
    let csv = "Predicted Power Output (kW),Timestamp\n\
               40.5,2025-06-02 12:00:00\n\
               12,2025-06-01 09:00:00\n";
    Mock::given(method("GET"))
        .and(path("/history.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv))
        .mount(&server)
        .await;

    let (status, body) = get_json(app(&server), "/api/v1/history").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["record_count"], 2);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows[0]["Timestamp"], "2025-06-01T09:00:00");
    assert_eq!(rows[0]["Predicted Power Output (kW)"], 12.0);
    assert_eq!(rows[1]["Predicted Power Output (kW)"], 40.5);
}

#[tokio::test]
async fn test_history_without_prediction_column_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Timestamp,GHI\n2025-06-01 09:00,10\n"))
        .mount(&server)
        .await;

    let (status, body) = get_json(app(&server), "/api/v1/history").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "DataFormat");
}

#[tokio::test]
async fn test_atmospheric_groups_by_unit() {
    let server = MockServer::start().await;
    let csv = "DATETIME,TMP,DP,CLOUD,SLP\n\
               2025-06-01 00:00,14.2,9.1,80,1012.5\n\
               2025-06-01 01:00,13.8,9.0,65,1012.9\n";
    Mock::given(method("GET"))
        .and(path("/spotwx"))
        .and(query_param("key", "spot-key"))
        .and(query_param("model", "gfs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv))
        .mount(&server)
        .await;

    let (status, body) = get_json(app(&server), "/api/v1/atmospheric").await;

    assert_eq!(status, StatusCode::OK);
    let groups = body["data"].as_array().unwrap();
    let units: Vec<&str> = groups.iter().map(|g| g["unit"].as_str().unwrap()).collect();
    assert_eq!(units, vec!["Cloud Cover (%)", "Temperature (°C)", "Pressure (hPa)"]);

    let temperature = &groups[1]["series"];
    assert_eq!(temperature[0]["variable"], "TMP");
    assert_eq!(temperature[1]["label"], "Dew Point (°C)");
    assert_eq!(temperature[0]["points"][1]["value"], 13.8);
}
