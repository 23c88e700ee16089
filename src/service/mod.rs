//! Domain operations over the document store.
//!
//! [`EnergyService`] groups the building registry, the energy-data ledger,
//! and the optimize transition. Each operation is a single request/response
//! unit of work with no state kept between calls.

mod ledger;
mod optimize;
mod registry;

use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::model::{DocumentId, non_blank};
use crate::store::EnergyStore;

pub use ledger::PREDICTION_LIMIT;
pub use optimize::{CONSUMPTION_FACTOR, PREDICTED_FACTOR, optimized_reading};

/// Domain service shared by all request handlers.
#[derive(Clone)]
pub struct EnergyService {
    store: Arc<dyn EnergyStore>,
}

impl EnergyService {
    pub fn new(store: Arc<dyn EnergyStore>) -> Self {
        Self { store }
    }
}

/// Resolves a required `buildingId` argument.
fn required_building_id(raw: Option<&str>) -> ServiceResult<DocumentId> {
    let raw = non_blank(raw).ok_or_else(|| ServiceError::validation("Building ID is required"))?;
    DocumentId::parse_field("buildingId", raw)
}
