//! End-to-end runs of the forecast pipeline against a mock forecast source.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cirrus_forecast::{
    domain::{ForecastWindow, GHI_COLUMN},
    forecast::{ForecastFetcher, GeoLocation},
    irradiance::IrradianceLoader,
    ml,
    pipeline::ForecastPipeline,
    PipelineError,
};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const START: i64 = 1_735_689_600; // 2025-01-01T00:00:00Z

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn window() -> ForecastWindow {
    let now = DateTime::parse_from_rfc3339("2025-01-01T00:20:00Z")
        .unwrap()
        .with_timezone(&Utc);
    ForecastWindow::starting_at(now, 4)
}

fn forecast_document(columns: &[&str], temperatures: &[f64]) -> Value {
    let index: Vec<i64> = (0..temperatures.len() as i64).map(|h| START + h * 3600).collect();
    let data: Vec<Vec<Value>> = temperatures
        .iter()
        .map(|t| {
            columns
                .iter()
                .map(|c| match *c {
                    "temperature (degC)" => json!(t),
                    "dewpoint_temperature (degC)" => json!(t - 3.0),
                    "relative_humidity (0-1)" => json!(0.8),
                    "wind_speed (m/s)" => json!(3.0),
                    "wind_direction (deg)" => json!(270),
                    "total_cloud_cover (0-1)" => json!(0.5),
                    _ => Value::Null,
                })
                .collect()
        })
        .collect();

    json!({ "columns": columns, "index": index, "data": data })
}

const ALL_COLUMNS: [&str; 6] = [
    "temperature (degC)",
    "dewpoint_temperature (degC)",
    "relative_humidity (0-1)",
    "wind_speed (m/s)",
    "wind_direction (deg)",
    "total_cloud_cover (0-1)",
];

async fn pipeline(server: &MockServer, irradiance: &str) -> ForecastPipeline {
    let fetcher = ForecastFetcher::new(
        format!("{}/forecast", server.uri()),
        "test-key",
        "HRRR",
        GeoLocation {
            latitude: 46.2382,
            longitude: -63.1311,
            name: None,
        },
        chrono_tz::UTC,
        Duration::from_secs(5),
    )
    .unwrap();
    let loader = IrradianceLoader::new(irradiance, chrono_tz::UTC);
    let model = ml::load_model(fixture("model.json")).unwrap();
    ForecastPipeline::new(fetcher, loader, model, 4)
}

#[tokio::test]
async fn test_full_pipeline_applies_override_fill_and_clip() {
    let server = MockServer::start().await;
    let doc = forecast_document(&ALL_COLUMNS, &[-5.0, -2.0, -1.0, 0.0, 1.0]);

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(header("api-key", "test-key"))
        .and(query_param("param", "dewpoint_temperature"))
        .and(query_param("model", "HRRR"))
        .and(query_param("start", "2025-01-01T00:00:00Z"))
        .and(query_param("end", "2025-01-01T04:00:00Z"))
        .and(query_param("freq", "H"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": doc.to_string() })))
        .expect(1)
        .mount(&server)
        .await;

    let records = pipeline(&server, &fixture("solar.csv"))
        .await
        .run(&window())
        .await
        .unwrap();

    let predictions: Vec<f64> = records.iter().map(|r| r.predicted_power_kw).collect();
    assert_eq!(predictions.len(), 5);

    // GHI is exactly zero at 00:00
    assert_eq!(predictions[0], 0.0);
    // -2 + 0.5 * 250 - 10
    assert!((predictions[1] - 113.0).abs() < 1e-9);
    // no irradiance row at 02:00, GHI carried forward from 01:00
    assert!((predictions[2] - 114.0).abs() < 1e-9);
    // raw output is negative at 03:00 and 04:00
    assert_eq!(predictions[3], 0.0);
    assert_eq!(predictions[4], 0.0);

    let ghi_at_two = records[2]
        .features
        .iter()
        .find(|(name, _)| name == GHI_COLUMN)
        .and_then(|(_, v)| *v);
    assert_eq!(ghi_at_two, Some(250.0));

    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.timestamp.timestamp(), START + i as i64 * 3600);
    }
}

#[tokio::test]
async fn test_upstream_503_stops_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = pipeline(&server, &fixture("solar.csv"))
        .await
        .run(&window())
        .await;

    match result {
        Err(PipelineError::UpstreamUnavailable(msg)) => assert!(msg.contains("503")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_payload_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": "{\"columns\": [" })),
        )
        .mount(&server)
        .await;

    let result = pipeline(&server, &fixture("solar.csv"))
        .await
        .run(&window())
        .await;
    assert!(matches!(result, Err(PipelineError::ResponseParse(_))));
}

#[tokio::test]
async fn test_missing_forecast_variable_is_schema_mismatch() {
    let server = MockServer::start().await;
    let doc = forecast_document(&ALL_COLUMNS[..4], &[1.0, 2.0]);
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": doc.to_string() })))
        .mount(&server)
        .await;

    let result = pipeline(&server, &fixture("solar.csv"))
        .await
        .run(&window())
        .await;

    match result {
        Err(PipelineError::SchemaMismatch { missing }) => {
            assert_eq!(missing, vec!["wind_direction_deg", "total_cloud_cover"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_irradiance_file_is_data_format_error() {
    let server = MockServer::start().await;
    let doc = forecast_document(&ALL_COLUMNS, &[1.0]);
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": doc.to_string() })))
        .mount(&server)
        .await;

    let result = pipeline(&server, &fixture("absent.csv"))
        .await
        .run(&window())
        .await;
    assert!(matches!(result, Err(PipelineError::DataFormat(_))));
}
