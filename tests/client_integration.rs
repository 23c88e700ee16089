//! HTTP client against a live server on an ephemeral port.

#![cfg(feature = "client")]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use energy_dash::api::{AppState, router};
use energy_dash::client::{ClientError, EnergyClient};
use energy_dash::model::{DocumentId, NewBuilding, NewEnergyData};
use energy_dash::service::EnergyService;
use energy_dash::store::MemoryStore;

/// Serves a fresh in-memory API and returns a client pointed at it.
async fn spawn_server() -> EnergyClient {
    let state = AppState::new(EnergyService::new(Arc::new(MemoryStore::new())));
    let app = router(state, "/api");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    EnergyClient::new(&format!("http://{addr}/api"))
}

fn main_office() -> NewBuilding {
    NewBuilding {
        name: Some("Main Office".into()),
        target_temperature: Some(22.0),
        auto_adjust_enabled: Some(true),
        peak_threshold: Some(75.0),
    }
}

#[tokio::test]
async fn dashboard_flow_round_trips() {
    let client = spawn_server().await;

    let building = client.create_building(&main_office()).await.unwrap();
    let buildings = client.fetch_buildings().await.unwrap();
    assert_eq!(buildings, vec![building.clone()]);

    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    for h in 0..3 {
        client
            .create_energy_data(&NewEnergyData {
                building_id: Some(building.id.to_string()),
                timestamp: Some(t0 + Duration::hours(h)),
                consumption: Some(100.0),
                predicted_consumption: Some(50.0),
                temperature: Some(21.0),
                optimization_enabled: Some(true),
            })
            .await
            .unwrap();
    }

    let start = Some(t0 + Duration::hours(1));
    let end = Some(t0 + Duration::hours(2));
    let ranged = client
        .fetch_energy_data(building.id, start, end)
        .await
        .unwrap();
    assert_eq!(ranged.len(), 2);

    let optimized = client.optimize_energy(building.id).await.unwrap();
    assert_eq!(optimized.consumption, 90.0);
    assert_eq!(optimized.predicted_consumption, 42.5);
    assert_eq!(optimized.temperature, 22.0);

    let all = client.fetch_energy_data(building.id, None, None).await.unwrap();
    assert_eq!(all.len(), 4);

    // only the optimized row, stamped with the server clock, can be current
    let predictions = client.fetch_predictions(building.id).await.unwrap();
    assert!(predictions.len() <= 1);
}

#[tokio::test]
async fn server_errors_carry_message_and_status() {
    let client = spawn_server().await;

    let err = client
        .optimize_energy(DocumentId::generate())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        ClientError::Api { message, .. } => assert_eq!(message, "Building not found"),
        other => panic!("unexpected error: {other}"),
    }

    let err = client
        .create_building(&NewBuilding::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}
