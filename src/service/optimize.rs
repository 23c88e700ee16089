//! The optimize transition.
//!
//! Scales the building's latest reading by fixed factors and records the
//! result as a new reading. The prior row is never touched, and no lock
//! spans the read and the insert: concurrent calls may derive from the same
//! latest row and each insert their own.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{EnergyService, required_building_id};
use crate::error::ServiceResult;
use crate::model::{Building, DocumentId, EnergyData};

/// Multiplier applied to the latest measured consumption.
pub const CONSUMPTION_FACTOR: f64 = 0.9;
/// Multiplier applied to the latest predicted consumption.
pub const PREDICTED_FACTOR: f64 = 0.85;

/// Derives the optimized reading from a building and its latest reading.
///
/// A building without readings starts from zero consumption.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use energy_dash::model::{Building, DocumentId};
/// use energy_dash::service::optimized_reading;
///
/// let now = Utc::now();
/// let building = Building {
///     id: DocumentId::generate(),
///     name: "HQ".into(),
///     target_temperature: 21.0,
///     auto_adjust_enabled: true,
///     peak_threshold: 80.0,
///     created_at: now,
///     updated_at: now,
/// };
/// let row = optimized_reading(&building, None, now);
/// assert_eq!(row.consumption, 0.0);
/// assert_eq!(row.temperature, 21.0);
/// ```
pub fn optimized_reading(
    building: &Building,
    latest: Option<&EnergyData>,
    now: DateTime<Utc>,
) -> EnergyData {
    let (consumption, predicted) =
        latest.map_or((0.0, 0.0), |r| (r.consumption, r.predicted_consumption));

    EnergyData {
        id: DocumentId::generate(),
        building_id: building.id,
        timestamp: now,
        consumption: consumption * CONSUMPTION_FACTOR,
        predicted_consumption: predicted * PREDICTED_FACTOR,
        temperature: building.target_temperature,
        optimization_enabled: true,
    }
}

impl EnergyService {
    /// Runs the optimize transition for one building and returns the new row.
    ///
    /// # Errors
    ///
    /// - validation error if `building_id` is absent or malformed
    /// - not-found error if the building does not exist (nothing is written)
    pub async fn optimize(&self, building_id: Option<&str>) -> ServiceResult<EnergyData> {
        let building_id = required_building_id(building_id)?;
        let building = self.get_building(building_id).await?;

        let latest = self.store.latest_energy_data(building_id).await?;
        debug!(
            building_id = %building_id,
            has_reading = latest.is_some(),
            "Optimizing from latest reading"
        );

        let row = optimized_reading(&building, latest.as_ref(), Utc::now());
        let row = self.store.insert_energy_data(row).await?;
        info!(
            building_id = %building_id,
            energy_data_id = %row.id,
            consumption = row.consumption,
            predicted_consumption = row.predicted_consumption,
            "Optimization applied"
        );
        Ok(row)
    }
}
