// In-memory document store.
// Locks are held only for the duration of a push or a scan, never across an await.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{EnergyQuery, EnergyStore, latest_for};
use crate::error::StoreResult;
use crate::model::{Building, DocumentId, EnergyData};

/// Process-local collections. All data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buildings: RwLock<Vec<Building>>,
    energy_data: RwLock<Vec<EnergyData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the collections with already-persisted documents.
    pub(crate) fn with_documents(buildings: Vec<Building>, energy_data: Vec<EnergyData>) -> Self {
        Self {
            buildings: RwLock::new(buildings),
            energy_data: RwLock::new(energy_data),
        }
    }

    pub(crate) fn push_building(&self, building: Building) {
        self.buildings.write().push(building);
    }

    pub(crate) fn push_energy_data(&self, row: EnergyData) {
        self.energy_data.write().push(row);
    }

    pub(crate) fn buildings(&self) -> Vec<Building> {
        self.buildings.read().clone()
    }

    pub(crate) fn building(&self, id: DocumentId) -> Option<Building> {
        self.buildings.read().iter().find(|b| b.id == id).cloned()
    }

    pub(crate) fn query(&self, query: &EnergyQuery) -> Vec<EnergyData> {
        query.select(self.energy_data.read().iter())
    }

    pub(crate) fn latest(&self, building_id: DocumentId) -> Option<EnergyData> {
        latest_for(self.energy_data.read().iter(), building_id)
    }
}

#[async_trait]
impl EnergyStore for MemoryStore {
    async fn insert_building(&self, building: Building) -> StoreResult<Building> {
        self.push_building(building.clone());
        Ok(building)
    }

    async fn list_buildings(&self) -> StoreResult<Vec<Building>> {
        Ok(self.buildings())
    }

    async fn get_building(&self, id: DocumentId) -> StoreResult<Option<Building>> {
        Ok(self.building(id))
    }

    async fn insert_energy_data(&self, row: EnergyData) -> StoreResult<EnergyData> {
        self.push_energy_data(row.clone());
        Ok(row)
    }

    async fn find_energy_data(&self, query: &EnergyQuery) -> StoreResult<Vec<EnergyData>> {
        Ok(self.query(query))
    }

    async fn latest_energy_data(
        &self,
        building_id: DocumentId,
    ) -> StoreResult<Option<EnergyData>> {
        Ok(self.latest(building_id))
    }
}
