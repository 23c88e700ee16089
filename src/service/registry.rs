//! Building registry operations.

use chrono::Utc;
use tracing::{debug, info};

use super::EnergyService;
use crate::error::{ServiceError, ServiceResult};
use crate::model::{Building, DocumentId, NewBuilding};

impl EnergyService {
    /// Returns every building, no pagination.
    pub async fn list_buildings(&self) -> ServiceResult<Vec<Building>> {
        debug!("Listing buildings");
        let buildings = self.store.list_buildings().await?;
        debug!(count = buildings.len(), "Listed buildings");
        Ok(buildings)
    }

    /// Validates and persists a new building with a generated id.
    pub async fn create_building(&self, input: NewBuilding) -> ServiceResult<Building> {
        let building = input.into_building(DocumentId::generate(), Utc::now())?;
        let building = self.store.insert_building(building).await?;
        info!(building_id = %building.id, name = %building.name, "Building created");
        Ok(building)
    }

    /// Looks up a single building.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] if no building has this id.
    pub async fn get_building(&self, id: DocumentId) -> ServiceResult<Building> {
        self.store
            .get_building(id)
            .await?
            .ok_or(ServiceError::NotFound("Building"))
    }
}
