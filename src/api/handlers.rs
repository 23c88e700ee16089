//! Request handlers for the API endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::AppState;
use super::types::{ApiError, HealthResponse, OptimizeRequest, PredictionsQuery};
use crate::error::ServiceError;
use crate::model::{Building, EnergyData, EnergyDataFilter, NewBuilding, NewEnergyData};

type ApiResult<T> = Result<T, ApiError>;

const FETCH_BUILDINGS: &str = "Failed to fetch buildings";
const CREATE_BUILDING: &str = "Failed to create building";
const FETCH_ENERGY_DATA: &str = "Failed to fetch energy data";
const CREATE_ENERGY_DATA: &str = "Failed to create energy data";
const FETCH_PREDICTIONS: &str = "Failed to fetch predictions";
const OPTIMIZE: &str = "Failed to optimize energy consumption";

/// Unwraps a JSON body, turning rejections into validation errors.
fn body<T>(operation: &'static str, payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(inner)| inner).map_err(|rejection| {
        ApiError::new(
            operation,
            ServiceError::validation(format!("Invalid request body: {}", rejection.body_text())),
        )
    })
}

/// Raw query-string pairs, in request order.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Decodes a query string into `T`. A repeated key keeps its first value.
fn query<T: DeserializeOwned>(operation: &'static str, params: QueryPairs) -> ApiResult<T> {
    let invalid = |detail: String| {
        ApiError::new(
            operation,
            ServiceError::validation(format!("Invalid query string: {detail}")),
        )
    };
    let Query(pairs) = params.map_err(|rejection| invalid(rejection.body_text()))?;

    let mut fields = Map::new();
    for (key, value) in pairs {
        fields.entry(key).or_insert(Value::String(value));
    }
    serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(e.to_string()))
}

/// `GET /buildings` → 200 + `Vec<Building>`
pub async fn list_buildings(State(state): State<AppState>) -> ApiResult<Json<Vec<Building>>> {
    state
        .service
        .list_buildings()
        .await
        .map(Json)
        .map_err(|e| ApiError::new(FETCH_BUILDINGS, e))
}

/// `POST /buildings` → 201 + created `Building`
///
/// Missing or wrongly typed fields → 400.
pub async fn create_building(
    State(state): State<AppState>,
    payload: Result<Json<NewBuilding>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Building>)> {
    let input = body(CREATE_BUILDING, payload)?;
    let building = state
        .service
        .create_building(input)
        .await
        .map_err(|e| ApiError::new(CREATE_BUILDING, e))?;
    Ok((StatusCode::CREATED, Json(building)))
}

/// `GET /energy-data` → 200 + `Vec<EnergyData>` ascending by timestamp
///
/// `?buildingId=..&startDate=..&endDate=..`; the range applies only when
/// both dates are given.
pub async fn list_energy_data(
    State(state): State<AppState>,
    params: QueryPairs,
) -> ApiResult<Json<Vec<EnergyData>>> {
    let filter: EnergyDataFilter = query(FETCH_ENERGY_DATA, params)?;
    state
        .service
        .list_energy_data(&filter)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(FETCH_ENERGY_DATA, e))
}

/// `POST /energy-data` → 201 + created `EnergyData`
pub async fn create_energy_data(
    State(state): State<AppState>,
    payload: Result<Json<NewEnergyData>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EnergyData>)> {
    let input = body(CREATE_ENERGY_DATA, payload)?;
    let row = state
        .service
        .create_energy_data(input)
        .await
        .map_err(|e| ApiError::new(CREATE_ENERGY_DATA, e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /predictions?buildingId=..` → 200 + at most 24 upcoming rows
///
/// Missing `buildingId` → 400.
pub async fn list_predictions(
    State(state): State<AppState>,
    params: QueryPairs,
) -> ApiResult<Json<Vec<EnergyData>>> {
    let request: PredictionsQuery = query(FETCH_PREDICTIONS, params)?;
    state
        .service
        .list_predictions(request.building_id.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::new(FETCH_PREDICTIONS, e))
}

/// `POST /optimize` with `{ "buildingId": .. }` → 200 + new `EnergyData`
///
/// Missing id → 400, unknown building → 404.
pub async fn optimize(
    State(state): State<AppState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> ApiResult<Json<EnergyData>> {
    let request = body(OPTIMIZE, payload)?;
    state
        .service
        .optimize(request.building_id.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::new(OPTIMIZE, e))
}

/// `GET /health` → 200 + `{"status":"ok"}`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
