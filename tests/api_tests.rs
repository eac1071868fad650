use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use asset_usage_tracker::cache::{TelemetryCache, TelemetryCacheConfig};
use asset_usage_tracker::clients::MockTelemetryProvider;
use asset_usage_tracker::config::EnvironmentConfig;
use asset_usage_tracker::repositories::InMemoryAssetRepository;
use asset_usage_tracker::{create_app, AppState};

const T0: i64 = 1_700_000_000;
const BOAT_DEVICE: &str = "355468593059041";
const TRUCK_DEVICE: &str = "861234";

struct TestApp {
    state: AppState,
    mock: Arc<MockTelemetryProvider>,
}

impl TestApp {
    fn new() -> Self {
        let mock = Arc::new(MockTelemetryProvider::new());
        let telemetry = Arc::new(TelemetryCache::new(
            mock.clone(),
            mock.clone(),
            TelemetryCacheConfig::default(),
        ));
        let config = EnvironmentConfig {
            cors_origins: vec!["*".to_string()],
            bootstrap: None,
            ..EnvironmentConfig::default()
        };
        let state = AppState::new(config, Arc::new(InMemoryAssetRepository::new()), telemetry, "memory");
        Self { state, mock }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = create_app(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn create_asset(&self, name: &str, device_id: &str, kind: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/assets",
                Some(json!({ "name": name, "device_id": device_id, "kind": kind })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

async fn next_window() {
    tokio::time::advance(Duration::from_secs(21)).await;
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["telemetry_cache"]["upstream_calls"], 0);
}

#[tokio::test(start_paused = true)]
async fn test_health_reports_cache_counters() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;
    app.mock.set_engine(BOAT_DEVICE, T0, true);

    app.get(&format!("/api/assets/{}/usage", boat)).await;
    app.get(&format!("/api/assets/{}/usage", boat)).await;

    let (_, body) = app.get("/health").await;
    assert_eq!(body["telemetry_cache"]["misses"], 1);
    assert_eq!(body["telemetry_cache"]["hits"], 1);
    assert_eq!(body["telemetry_cache"]["upstream_calls"], 1);
    assert_eq!(body["telemetry_cache"]["token_refreshes"], 1);
}

#[tokio::test]
async fn test_create_and_list_assets() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;
    app.create_asset("Caminhão 01", TRUCK_DEVICE, "truck").await;

    let (status, body) = app.get("/api/assets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["current_asset_id"], boat.as_str());
    assert_eq!(body["assets"][0]["measurement_basis"], "hours");
    assert_eq!(body["assets"][0]["is_current"], true);
    assert_eq!(body["assets"][1]["unit"], "km");
    assert_eq!(body["assets"][1]["maintenance_plan"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/assets",
            Some(json!({ "name": "  ", "device_id": BOAT_DEVICE })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test(start_paused = true)]
async fn test_usage_accumulates_across_polls() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;

    app.mock.set_engine(BOAT_DEVICE, T0, true);
    let (status, body) = app.get(&format!("/api/assets/{}/usage", boat)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"], 0.0);
    assert_eq!(body["unit"], "h");
    assert_eq!(body["engine_on"], true);

    next_window().await;
    app.mock.set_engine(BOAT_DEVICE, T0 + 3_600, true);
    let (_, body) = app.get(&format!("/api/assets/{}/usage", boat)).await;
    assert_eq!(body["usage"], 1.0);

    // Misma ventana de cache: el uso no cambia y no hay otra llamada al proveedor
    let (_, body) = app.get("/api/current/usage").await;
    assert_eq!(body["usage"], 1.0);
    assert_eq!(app.mock.track_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_calibration_drives_maintenance_status() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;
    app.mock.set_engine(BOAT_DEVICE, T0, false);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/assets/{}/calibration", boat),
            Some(json!({ "value": "95" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["usage"], 95.0);

    let (status, body) = app.get("/api/current/maintenance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"], 95.0);
    assert_eq!(body["tasks"][0]["status"], "DUE_SOON");
    assert_eq!(body["tasks"][0]["remaining"], 5.0);
    assert_eq!(body["tasks"][3]["status"], "OK");

    let (_, body) = app.get(&format!("/api/assets/{}/calibration", boat)).await;
    assert_eq!(body["usage"], 95.0);
}

#[tokio::test]
async fn test_non_numeric_calibration_is_rejected() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/assets/{}/calibration", boat),
            Some(json!({ "value": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CALIBRATION");
    assert_eq!(app.mock.track_calls(), 0);
}

#[tokio::test]
async fn test_offset_only_for_distance_assets() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;
    let truck = app.create_asset("Caminhão 01", TRUCK_DEVICE, "truck").await;

    let (status, _) = app
        .send(Method::PUT, &format!("/api/assets/{}/offset", boat), Some(json!({ "value": 10 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(Method::PUT, &format!("/api/assets/{}/offset", truck), Some(json!({ "value": "12.5" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["calibration_offset"], 12.5);

    let (_, body) = app.get(&format!("/api/assets/{}/offset", truck)).await;
    assert_eq!(body["calibration_offset"], 12.5);
    assert_eq!(body["measurement_basis"], "distance");
}

#[tokio::test]
async fn test_plan_round_trip() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/assets/{}/plan", boat),
            Some(json!({
                "items": [
                    { "name": "Troca de óleo", "unit": "hours", "first_threshold": 50, "interval": 50 }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["warn_before"], 10.0);

    let (_, body) = app.get(&format!("/api/assets/{}/plan", boat)).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_current_without_assets_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/current/usage").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No asset registered");
}

#[tokio::test]
async fn test_unknown_asset_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .get("/api/assets/00000000-0000-0000-0000-000000000000/usage")
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_rejected_credentials_surface_as_service_unavailable() {
    let app = TestApp::new();
    let boat = app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;
    app.mock.set_engine(BOAT_DEVICE, T0, true);
    app.mock.reject_token("mock-token-1");
    app.mock.reject_token("mock-token-2");

    let (status, body) = app.get(&format!("/api/assets/{}/usage", boat)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "UPSTREAM_AUTH_ERROR");
}

#[tokio::test]
async fn test_fleet_reports_partial_failures() {
    let app = TestApp::new();
    app.create_asset("Embarcação 01", BOAT_DEVICE, "boat").await;
    app.create_asset("Caminhão 01", TRUCK_DEVICE, "truck").await;
    app.mock.set_engine(BOAT_DEVICE, T0, true);

    let (status, body) = app.get("/api/fleet/usage").await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0]["snapshot"].is_object());
    assert!(entries[1]["error"].as_str().unwrap().contains(TRUCK_DEVICE));
}

#[tokio::test]
async fn test_delete_moves_current_asset() {
    let app = TestApp::new();
    let first = app.create_asset("A", BOAT_DEVICE, "boat").await;
    let second = app.create_asset("B", TRUCK_DEVICE, "truck").await;

    let (status, _) = app.send(Method::DELETE, &format!("/api/assets/{}", first), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/assets").await;
    assert_eq!(body["current_asset_id"], second.as_str());

    let (status, _) = app.send(Method::DELETE, &format!("/api/assets/{}", first), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
