//! Synthetic demo data for a fresh store.
//!
//! Seeds one building with a day of past readings and a day of upcoming
//! predictions so the dashboard has something to draw.

use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use crate::error::ServiceResult;
use crate::model::{Building, NewBuilding, NewEnergyData};
use crate::service::EnergyService;

/// Hours of history and of upcoming predictions seeded on each side of now.
pub const DEMO_HOURS: i64 = 24;

/// Daily consumption profile: a sinusoid around a base load plus noise.
///
/// # Examples
///
/// ```
/// use energy_dash::demo::LoadProfile;
///
/// let mut profile = LoadProfile::new(50.0, 20.0, 1.2, 0.0, 24, 42);
/// let noon = profile.demand_kw(12);
/// assert!(noon >= 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LoadProfile {
    /// Baseline consumption in kilowatts
    pub base_kw: f64,

    /// Amplitude of the daily variation in kilowatts
    pub amp_kw: f64,

    /// Phase offset of the daily pattern in radians
    pub phase_rad: f64,

    /// Standard deviation of the Gaussian noise in kilowatts
    pub noise_std: f64,

    /// Number of steps per day
    pub steps_per_day: usize,

    rng: StdRng,
}

impl LoadProfile {
    /// Creates a profile with the given shape and a seeded noise source.
    pub fn new(
        base_kw: f64,
        amp_kw: f64,
        phase_rad: f64,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Noise-free demand at a step of the day (kW, never negative).
    pub fn expected_kw(&self, step: usize) -> f64 {
        let day_pos = (step % self.steps_per_day) as f64 / self.steps_per_day as f64;
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        (self.base_kw + self.amp_kw * angle.sin()).max(0.0)
    }

    /// Demand with Gaussian noise at a step of the day (kW, never negative).
    pub fn demand_kw(&mut self, step: usize) -> f64 {
        let noise = if self.noise_std > 0.0 {
            // Box-Muller
            let u1: f64 = self.rng.random::<f64>().clamp(1e-9, 1.0);
            let u2: f64 = self.rng.random::<f64>();
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            z0 * self.noise_std
        } else {
            0.0
        };
        (self.expected_kw(step) + noise).max(0.0)
    }
}

/// Builds hourly readings spanning `DEMO_HOURS` before and after `now`.
///
/// Past hours carry a noisy measured consumption; upcoming hours carry the
/// noise-free profile as both consumption and prediction.
pub fn demo_readings(
    building: &Building,
    now: DateTime<Utc>,
    profile: &mut LoadProfile,
) -> Vec<NewEnergyData> {
    let start = now
        .duration_trunc(Duration::hours(1))
        .unwrap_or(now)
        - Duration::hours(DEMO_HOURS);

    (0..DEMO_HOURS * 2)
        .map(|h| {
            let timestamp = start + Duration::hours(h + 1);
            let step = h as usize;
            let predicted = profile.expected_kw(step);
            let consumption = if timestamp <= now {
                profile.demand_kw(step)
            } else {
                predicted
            };
            NewEnergyData {
                building_id: Some(building.id.to_string()),
                timestamp: Some(timestamp),
                consumption: Some(round2(consumption)),
                predicted_consumption: Some(round2(predicted)),
                temperature: Some(building.target_temperature),
                optimization_enabled: Some(building.auto_adjust_enabled),
            }
        })
        .collect()
}

/// Creates a demo building and its readings through the service.
///
/// # Errors
///
/// Propagates any validation or storage error from the service.
pub async fn seed_demo(
    service: &EnergyService,
    name: &str,
    seed: u64,
) -> ServiceResult<(Building, usize)> {
    let building = service
        .create_building(NewBuilding {
            name: Some(name.to_string()),
            target_temperature: Some(22.0),
            auto_adjust_enabled: Some(true),
            peak_threshold: Some(75.0),
        })
        .await?;

    let mut profile = LoadProfile::new(50.0, 20.0, 1.2, 2.5, 24, seed);
    let readings = demo_readings(&building, Utc::now(), &mut profile);
    let count = readings.len();
    for reading in readings {
        service.create_energy_data(reading).await?;
    }

    info!(building_id = %building.id, readings = count, "Seeded demo data");
    Ok((building, count))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
