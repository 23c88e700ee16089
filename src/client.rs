//! HTTP client for the energy API.
//!
//! Feature-gated behind `client`. Used by the terminal dashboard and usable
//! on its own against any running server.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{ErrorResponse, OptimizeRequest};
use crate::model::{Building, DocumentId, EnergyData, NewBuilding, NewEnergyData};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// HTTP status of an API error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Thin wrapper over `reqwest` for the `/api` routes.
#[derive(Debug, Clone)]
pub struct EnergyClient {
    base_url: String,
    http: reqwest::Client,
}

impl EnergyClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_buildings(&self) -> ClientResult<Vec<Building>> {
        self.get("/buildings", &[]).await
    }

    pub async fn create_building(&self, building: &NewBuilding) -> ClientResult<Building> {
        self.post("/buildings", building).await
    }

    /// Lists readings for a building. The range only applies when both
    /// bounds are given.
    pub async fn fetch_energy_data(
        &self,
        building_id: DocumentId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ClientResult<Vec<EnergyData>> {
        let mut query = vec![("buildingId", building_id.to_string())];
        if let Some(start) = start {
            query.push(("startDate", start.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        if let Some(end) = end {
            query.push(("endDate", end.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        self.get("/energy-data", &query).await
    }

    pub async fn create_energy_data(&self, row: &NewEnergyData) -> ClientResult<EnergyData> {
        self.post("/energy-data", row).await
    }

    pub async fn fetch_predictions(
        &self,
        building_id: DocumentId,
    ) -> ClientResult<Vec<EnergyData>> {
        self.get("/predictions", &[("buildingId", building_id.to_string())])
            .await
    }

    pub async fn optimize_energy(&self, building_id: DocumentId) -> ClientResult<EnergyData> {
        let body = OptimizeRequest {
            building_id: Some(building_id.to_string()),
        };
        self.post("/optimize", &body).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| fallback_message(status, text));
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

fn fallback_message(status: StatusCode, text: String) -> String {
    if text.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        text
    }
}
