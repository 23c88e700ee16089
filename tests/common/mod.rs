//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use energy_dash::api::{AppState, router};
use energy_dash::service::EnergyService;
use energy_dash::store::{EnergyStore, MemoryStore};

/// Router over a fresh in-memory store, mounted under `/api`.
pub fn memory_app() -> Router {
    app_with_store(Arc::new(MemoryStore::new()))
}

/// Router over the given store, mounted under `/api`.
pub fn app_with_store(store: Arc<dyn EnergyStore>) -> Router {
    router(AppState::new(EnergyService::new(store)), "/api")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Sends one request and returns the status and JSON body.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Default building body (Main Office, 22 °C, auto-adjust on, 75 kW).
pub fn building_body(name: &str) -> Value {
    json!({
        "name": name,
        "targetTemperature": 22,
        "autoAdjustEnabled": true,
        "peakThreshold": 75
    })
}

/// Creates a building and returns its id.
pub async fn create_building(app: &Router, name: &str) -> String {
    let (status, body) = send(app, post_json("/api/buildings", &building_body(name))).await;
    assert_eq!(status, StatusCode::CREATED, "create building: {body}");
    body["_id"].as_str().unwrap().to_string()
}

/// Reading body at `timestamp` with the given consumption values.
pub fn reading_body(
    building_id: &str,
    timestamp: DateTime<Utc>,
    consumption: f64,
    predicted: f64,
) -> Value {
    json!({
        "buildingId": building_id,
        "timestamp": timestamp,
        "consumption": consumption,
        "predictedConsumption": predicted,
        "temperature": 21.5,
        "optimizationEnabled": true
    })
}

/// Creates a reading and returns the stored document.
pub async fn create_reading(
    app: &Router,
    building_id: &str,
    timestamp: DateTime<Utc>,
    consumption: f64,
    predicted: f64,
) -> Value {
    let body = reading_body(building_id, timestamp, consumption, predicted);
    let (status, stored) = send(app, post_json("/api/energy-data", &body)).await;
    assert_eq!(status, StatusCode::CREATED, "create reading: {stored}");
    stored
}

/// Percent-encodes an RFC 3339 timestamp for a query string.
pub fn query_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        .replace(':', "%3A")
        .replace('+', "%2B")
}

pub fn approx(a: &Value, expected: f64) -> bool {
    a.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}
