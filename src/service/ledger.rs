//! Energy-data ledger: readings, filtered listings, and upcoming predictions.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{EnergyService, required_building_id};
use crate::error::ServiceResult;
use crate::model::{
    DocumentId, EnergyData, EnergyDataFilter, NewEnergyData, non_blank, parse_instant,
};
use crate::store::EnergyQuery;

/// Maximum number of rows returned by [`EnergyService::list_predictions`].
pub const PREDICTION_LIMIT: usize = 24;

impl EnergyService {
    /// Lists readings, ascending by timestamp.
    ///
    /// The time range applies only when both `startDate` and `endDate` are
    /// given; a lone bound is ignored. Malformed values are still rejected.
    pub async fn list_energy_data(
        &self,
        filter: &EnergyDataFilter,
    ) -> ServiceResult<Vec<EnergyData>> {
        let building_id = non_blank(filter.building_id.as_deref())
            .map(|raw| DocumentId::parse_field("buildingId", raw))
            .transpose()?;
        let start = non_blank(filter.start_date.as_deref())
            .map(|raw| parse_instant("startDate", raw))
            .transpose()?;
        let end = non_blank(filter.end_date.as_deref())
            .map(|raw| parse_instant("endDate", raw))
            .transpose()?;

        let (from, to) = match (start, end) {
            (Some(start), Some(end)) => (Some(start), Some(end)),
            (None, None) => (None, None),
            _ => {
                debug!("Single time bound given; range filter not applied");
                (None, None)
            }
        };

        let query = EnergyQuery {
            building_id,
            from,
            to,
            limit: None,
        };
        let rows = self.store.find_energy_data(&query).await?;
        debug!(count = rows.len(), "Listed energy data");
        Ok(rows)
    }

    /// Persists a reading as given, after required-field validation.
    pub async fn create_energy_data(&self, input: NewEnergyData) -> ServiceResult<EnergyData> {
        let row = input.into_energy_data(DocumentId::generate())?;
        let row = self.store.insert_energy_data(row).await?;
        info!(
            energy_data_id = %row.id,
            building_id = %row.building_id,
            timestamp = %row.timestamp,
            "Energy data recorded"
        );
        Ok(row)
    }

    /// Returns up to [`PREDICTION_LIMIT`] readings for a building at or after now.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `building_id` is absent, blank, or malformed.
    pub async fn list_predictions(
        &self,
        building_id: Option<&str>,
    ) -> ServiceResult<Vec<EnergyData>> {
        let building_id = required_building_id(building_id)?;
        self.predictions_since(building_id, Utc::now()).await
    }

    pub(crate) async fn predictions_since(
        &self,
        building_id: DocumentId,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<EnergyData>> {
        // Every stored row carries predictedConsumption, so the only filters
        // are building and time.
        let query = EnergyQuery {
            building_id: Some(building_id),
            from: Some(now),
            to: None,
            limit: Some(PREDICTION_LIMIT),
        };
        let rows = self.store.find_energy_data(&query).await?;
        debug!(building_id = %building_id, count = rows.len(), "Listed predictions");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::error::ServiceError;
    use crate::store::MemoryStore;

    fn service() -> EnergyService {
        EnergyService::new(Arc::new(MemoryStore::new()))
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn reading(building_id: DocumentId, at: DateTime<Utc>, consumption: f64) -> NewEnergyData {
        NewEnergyData {
            building_id: Some(building_id.to_string()),
            timestamp: Some(at),
            consumption: Some(consumption),
            predicted_consumption: Some(consumption * 0.95),
            temperature: Some(21.0),
            optimization_enabled: None,
        }
    }

    async fn seed_hours(service: &EnergyService, building_id: DocumentId, hours: i64) {
        // Insert in reverse so ordering comes from the query, not insertion.
        for h in (0..hours).rev() {
            service
                .create_energy_data(reading(building_id, base() + Duration::hours(h), h as f64))
                .await
                .unwrap();
        }
    }

    fn filter(building_id: DocumentId, start: Option<&str>, end: Option<&str>) -> EnergyDataFilter {
        EnergyDataFilter {
            building_id: Some(building_id.to_string()),
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn range_is_inclusive_and_ascending() {
        let service = service();
        let b = DocumentId::generate();
        seed_hours(&service, b, 12).await;

        let rows = service
            .list_energy_data(&filter(
                b,
                Some("2024-03-01T03:00:00Z"),
                Some("2024-03-01T06:00:00Z"),
            ))
            .await
            .unwrap();

        let hours: Vec<f64> = rows.iter().map(|r| r.consumption).collect();
        assert_eq!(hours, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[tokio::test]
    async fn single_bound_is_ignored() {
        let service = service();
        let b = DocumentId::generate();
        seed_hours(&service, b, 6).await;

        let only_start = service
            .list_energy_data(&filter(b, Some("2024-03-01T04:00:00Z"), None))
            .await
            .unwrap();
        let only_end = service
            .list_energy_data(&filter(b, None, Some("2024-03-01T01:00:00Z")))
            .await
            .unwrap();

        assert_eq!(only_start.len(), 6);
        assert_eq!(only_end.len(), 6);
    }

    #[tokio::test]
    async fn listing_filters_by_building() {
        let service = service();
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        seed_hours(&service, a, 3).await;
        seed_hours(&service, b, 5).await;

        let rows = service.list_energy_data(&filter(a, None, None)).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.building_id == a));

        let all = service
            .list_energy_data(&EnergyDataFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn malformed_date_is_a_validation_error() {
        let err = service()
            .list_energy_data(&filter(DocumentId::generate(), Some("soon"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_timestamps_are_kept() {
        let service = service();
        let b = DocumentId::generate();
        service.create_energy_data(reading(b, base(), 1.0)).await.unwrap();
        service.create_energy_data(reading(b, base(), 2.0)).await.unwrap();

        let rows = service.list_energy_data(&filter(b, None, None)).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn predictions_skip_past_rows_and_cap_at_limit() {
        let service = service();
        let b = DocumentId::generate();
        let now = base() + Duration::hours(10);
        seed_hours(&service, b, 48).await;

        let rows = service.predictions_since(b, now).await.unwrap();
        assert_eq!(rows.len(), PREDICTION_LIMIT);
        assert!(rows.iter().all(|r| r.timestamp >= now));
        assert_eq!(rows[0].timestamp, now);
        assert!(rows.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn predictions_use_current_time() {
        let service = service();
        let b = DocumentId::generate();
        let now = Utc::now();
        service
            .create_energy_data(reading(b, now - Duration::hours(1), 5.0))
            .await
            .unwrap();
        service
            .create_energy_data(reading(b, now + Duration::hours(1), 6.0))
            .await
            .unwrap();

        let id = b.to_string();
        let rows = service.list_predictions(Some(&id)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].consumption, 6.0);
    }

    #[tokio::test]
    async fn predictions_require_building_id() {
        let service = service();
        for missing in [None, Some(""), Some("  ")] {
            let err = service.list_predictions(missing).await.unwrap_err();
            assert_eq!(err.to_string(), "Building ID is required");
        }
    }
}
