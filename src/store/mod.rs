//! Document store for the building and energy-data collections.
//!
//! [`EnergyStore`] is the seam between the service layer and a backend.
//! Two backends ship with the crate:
//! - [`MemoryStore`]: process-local collections, lost on restart
//! - [`FileStore`]: append-only JSON-lines files reloaded on open

mod file;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::model::{Building, DocumentId, EnergyData};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Repository over the two document collections.
///
/// Backends only persist and query; ids, defaults, and validation are the
/// service layer's job.
#[async_trait]
pub trait EnergyStore: Send + Sync {
    /// Persists a new building document.
    async fn insert_building(&self, building: Building) -> StoreResult<Building>;

    /// Returns every building in insertion order.
    async fn list_buildings(&self) -> StoreResult<Vec<Building>>;

    /// Looks up a building by id.
    async fn get_building(&self, id: DocumentId) -> StoreResult<Option<Building>>;

    /// Persists a new energy-data document.
    async fn insert_energy_data(&self, row: EnergyData) -> StoreResult<EnergyData>;

    /// Returns rows matching `query`, ascending by timestamp.
    async fn find_energy_data(&self, query: &EnergyQuery) -> StoreResult<Vec<EnergyData>>;

    /// Returns the row with the greatest timestamp for a building.
    ///
    /// Among rows sharing that timestamp, the most recently inserted wins.
    async fn latest_energy_data(&self, building_id: DocumentId)
    -> StoreResult<Option<EnergyData>>;
}

/// Energy-data selection understood by every backend.
///
/// Bounds are independent and inclusive here; pairing them is a service
/// concern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyQuery {
    pub building_id: Option<DocumentId>,
    /// Lower timestamp bound (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// Upper timestamp bound (inclusive).
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of rows returned.
    pub limit: Option<usize>,
}

impl EnergyQuery {
    /// Returns `true` if `row` satisfies the building and time filters.
    pub fn matches(&self, row: &EnergyData) -> bool {
        let building_ok = self.building_id.is_none_or(|id| row.building_id == id);
        let from_ok = self.from.is_none_or(|from| row.timestamp >= from);
        let to_ok = self.to.is_none_or(|to| row.timestamp <= to);
        building_ok && from_ok && to_ok
    }

    /// Filters, sorts (stable, ascending by timestamp), and truncates.
    pub(crate) fn select<'a>(&self, rows: impl Iterator<Item = &'a EnergyData>) -> Vec<EnergyData> {
        let mut selected: Vec<EnergyData> = rows.filter(|r| self.matches(r)).cloned().collect();
        selected.sort_by_key(|r| r.timestamp);
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Picks the latest row for a building from an insertion-ordered slice.
pub(crate) fn latest_for<'a>(
    rows: impl Iterator<Item = &'a EnergyData>,
    building_id: DocumentId,
) -> Option<EnergyData> {
    // `max_by_key` keeps the last of equal maxima, i.e. the latest insert.
    rows.filter(|r| r.building_id == building_id)
        .max_by_key(|r| r.timestamp)
        .cloned()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn row(building_id: DocumentId, hour: u32, consumption: f64) -> EnergyData {
        EnergyData {
            id: DocumentId::generate(),
            building_id,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
            consumption,
            predicted_consumption: consumption,
            temperature: 21.0,
            optimization_enabled: true,
        }
    }

    #[test]
    fn select_sorts_ascending_and_keeps_ties_in_insertion_order() {
        let b = DocumentId::generate();
        let rows = vec![row(b, 5, 1.0), row(b, 2, 2.0), row(b, 5, 3.0), row(b, 1, 4.0)];
        let selected = EnergyQuery::default().select(rows.iter());
        let consumption: Vec<f64> = selected.iter().map(|r| r.consumption).collect();
        assert_eq!(consumption, vec![4.0, 2.0, 1.0, 3.0]);
    }

    #[test]
    fn select_applies_inclusive_bounds_and_limit() {
        let b = DocumentId::generate();
        let rows: Vec<EnergyData> = (0..10).map(|h| row(b, h, f64::from(h))).collect();
        let from = rows[2].timestamp;
        let query = EnergyQuery {
            building_id: Some(b),
            from: Some(from),
            to: Some(from + Duration::hours(4)),
            limit: Some(3),
        };
        let selected = query.select(rows.iter());
        let hours: Vec<f64> = selected.iter().map(|r| r.consumption).collect();
        assert_eq!(hours, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn latest_prefers_last_inserted_on_equal_timestamps() {
        let b = DocumentId::generate();
        let other = DocumentId::generate();
        let rows = vec![row(b, 3, 1.0), row(b, 7, 2.0), row(b, 7, 3.0), row(other, 9, 9.0)];
        let latest = latest_for(rows.iter(), b).unwrap();
        assert_eq!(latest.consumption, 3.0);
    }
}
