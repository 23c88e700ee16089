//! Building and energy-data documents plus their creation inputs.
//!
//! Field names follow the document layout consumed by the dashboard UI:
//! camelCase keys and an `_id` identity field.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Generated document identity (UUID v7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a caller-supplied id, naming the offending field on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if `raw` is not a valid id.
    pub fn parse_field(field: &str, raw: &str) -> ServiceResult<Self> {
        raw.trim()
            .parse()
            .map_err(|_| ServiceError::validation(format!("{field} \"{raw}\" is not a valid id")))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A monitored facility with a target temperature and usage threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    /// Target indoor temperature (°C).
    pub target_temperature: f64,
    pub auto_adjust_enabled: bool,
    /// Peak usage threshold (kW).
    pub peak_threshold: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One timestamped reading of actual and predicted consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyData {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Owning building. Not checked against the building collection.
    pub building_id: DocumentId,
    pub timestamp: DateTime<Utc>,
    /// Measured consumption (kW).
    pub consumption: f64,
    /// Predicted consumption (kW).
    pub predicted_consumption: f64,
    /// Indoor temperature at the time of the reading (°C).
    pub temperature: f64,
    /// Stored for the UI; nothing reads it to gate behavior.
    pub optimization_enabled: bool,
}

/// Request body for creating a building.
///
/// Every field is optional on the wire so missing fields surface as
/// validation errors instead of body rejections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBuilding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_adjust_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_threshold: Option<f64>,
}

impl NewBuilding {
    /// Validates required fields and builds the stored document.
    ///
    /// `autoAdjustEnabled` defaults to `true`; both timestamps are set to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] listing every missing or invalid field.
    pub fn into_building(self, id: DocumentId, now: DateTime<Utc>) -> ServiceResult<Building> {
        let mut problems = Vec::new();

        let name = match self.name {
            Some(name) if !name.trim().is_empty() => Some(name),
            Some(_) => {
                problems.push("name must not be empty".to_string());
                None
            }
            None => {
                problems.push("name is required".to_string());
                None
            }
        };
        let target_temperature = required_number(
            "targetTemperature",
            self.target_temperature,
            &mut problems,
        );
        let peak_threshold = required_number("peakThreshold", self.peak_threshold, &mut problems);

        match (name, target_temperature, peak_threshold) {
            (Some(name), Some(target_temperature), Some(peak_threshold)) => Ok(Building {
                id,
                name,
                target_temperature,
                auto_adjust_enabled: self.auto_adjust_enabled.unwrap_or(true),
                peak_threshold,
                created_at: now,
                updated_at: now,
            }),
            _ => Err(ServiceError::validation(format!(
                "Building validation failed: {}",
                problems.join(", ")
            ))),
        }
    }
}

/// Request body for creating an energy-data reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnergyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_enabled: Option<bool>,
}

impl NewEnergyData {
    /// Validates required fields and builds the stored document as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] listing every missing or invalid field.
    pub fn into_energy_data(self, id: DocumentId) -> ServiceResult<EnergyData> {
        let mut problems = Vec::new();

        let building_id = match self.building_id.as_deref().map(str::trim) {
            Some("") | None => {
                problems.push("buildingId is required".to_string());
                None
            }
            Some(raw) => match DocumentId::parse_field("buildingId", raw) {
                Ok(id) => Some(id),
                Err(err) => {
                    problems.push(err.to_string());
                    None
                }
            },
        };
        if self.timestamp.is_none() {
            problems.push("timestamp is required".to_string());
        }
        let consumption = required_number("consumption", self.consumption, &mut problems);
        let predicted_consumption = required_number(
            "predictedConsumption",
            self.predicted_consumption,
            &mut problems,
        );
        let temperature = required_number("temperature", self.temperature, &mut problems);

        match (
            building_id,
            self.timestamp,
            consumption,
            predicted_consumption,
            temperature,
        ) {
            (
                Some(building_id),
                Some(timestamp),
                Some(consumption),
                Some(predicted_consumption),
                Some(temperature),
            ) => Ok(EnergyData {
                id,
                building_id,
                timestamp,
                consumption,
                predicted_consumption,
                temperature,
                optimization_enabled: self.optimization_enabled.unwrap_or(true),
            }),
            _ => Err(ServiceError::validation(format!(
                "EnergyData validation failed: {}",
                problems.join(", ")
            ))),
        }
    }
}

/// Query string accepted by the energy-data listing.
///
/// Values stay raw so malformed input becomes a validation error; empty
/// strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyDataFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Parses an instant from either RFC 3339 or a bare `YYYY-MM-DD` date
/// (midnight UTC).
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] naming `field` if neither form parses.
pub fn parse_instant(field: &str, raw: &str) -> ServiceResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ServiceError::validation(format!("{field} \"{raw}\" is not a valid date")))
}

/// Returns `Some(raw)` only for non-blank values.
pub(crate) fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn required_number(field: &str, value: Option<f64>, problems: &mut Vec<String>) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(v),
        Some(_) => {
            problems.push(format!("{field} must be a finite number"));
            None
        }
        None => {
            problems.push(format!("{field} is required"));
            None
        }
    }
}
