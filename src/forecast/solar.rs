use chrono::Datelike;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{ForecastPoint, ForecastProvider, Site};
use crate::error::ForecastError;
use crate::schedule::types::{DayGrid, SLOTS_PER_DAY};

/// Peak plane-of-array irradiance on a clear day (W/m²).
const CLEAR_SKY_IRRADIANCE_W_M2: f32 = 1000.0;

/// A synthetic production forecast shaped like a clear-sky day.
///
/// Generation follows a half-sine between sunrise and sunset with
/// multiplicative Gaussian noise to mimic passing cloud. The noise stream
/// is seeded from `seed` and the target date, so a given day always yields
/// the same curve.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use solar_shift::forecast::{ForecastProvider, Site, SyntheticSolar};
/// use solar_shift::schedule::types::DayGrid;
///
/// let pv = SyntheticSolar::new(15_000.0, 13, 38, 0.0, 42);
/// let grid = DayGrid::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(), chrono_tz::UTC);
/// let site = Site { latitude: -1.29, longitude: 36.82 };
/// let points = pv.forecast(&site, &grid).unwrap();
/// assert_eq!(points.len(), 48);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticSolar {
    /// Energy produced in the best slot under ideal conditions (Wh).
    pub peak_wh: f32,
    /// Slot index when production starts (inclusive).
    pub sunrise_slot: usize,
    /// Slot index when production stops (exclusive).
    pub sunset_slot: usize,
    /// Standard deviation of the noise as a fraction of output.
    pub noise_std: f32,
    /// Base random seed.
    pub seed: u64,
}

impl SyntheticSolar {
    /// Creates a synthetic forecaster.
    ///
    /// Negative `peak_wh` and `noise_std` are clamped to zero; an inverted
    /// or out-of-range daylight window yields an all-zero curve.
    pub fn new(
        peak_wh: f32,
        sunrise_slot: usize,
        sunset_slot: usize,
        noise_std: f32,
        seed: u64,
    ) -> Self {
        Self {
            peak_wh: peak_wh.max(0.0),
            sunrise_slot,
            sunset_slot,
            noise_std: noise_std.max(0.0),
            seed,
        }
    }

    /// Fraction of peak output at `slot` (0.0 at night, 1.0 at solar noon).
    pub fn daylight_frac(&self, slot: usize) -> f32 {
        if self.sunrise_slot >= self.sunset_slot
            || self.sunset_slot > SLOTS_PER_DAY
            || slot < self.sunrise_slot
            || slot >= self.sunset_slot
        {
            return 0.0;
        }
        let span = (self.sunset_slot - self.sunrise_slot) as f32;
        let x = (slot - self.sunrise_slot) as f32 / span;
        (std::f32::consts::PI * x).sin().max(0.0)
    }
}

impl ForecastProvider for SyntheticSolar {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn forecast(&self, _site: &Site, grid: &DayGrid) -> Result<Vec<ForecastPoint>, ForecastError> {
        let day_seed = self
            .seed
            .wrapping_add(u64::from(grid.date().num_days_from_ce().unsigned_abs()));
        let mut rng = StdRng::seed_from_u64(day_seed);

        let points = (0..SLOTS_PER_DAY)
            .map(|slot| {
                let frac = self.daylight_frac(slot);
                let noise_mult = if frac > 0.0 {
                    1.0 + gaussian_noise(&mut rng, self.noise_std)
                } else {
                    1.0
                };
                let clear = (frac * noise_mult).max(0.0);
                ForecastPoint {
                    timestamp: grid.slot_start(slot).fixed_offset(),
                    generation_wh: self.peak_wh * clear,
                    irradiance_w_m2: Some(CLEAR_SKY_IRRADIANCE_W_M2 * clear),
                }
            })
            .collect();
        Ok(points)
    }
}

/// Gaussian noise via the Box-Muller transform.
///
/// Returns a sample with mean 0 and standard deviation `std_dev`; zero when
/// `std_dev <= 0`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::Africa::Nairobi;

    fn grid(day: u32) -> DayGrid {
        DayGrid::new(NaiveDate::from_ymd_opt(2025, 3, day).unwrap(), Nairobi)
    }

    fn site() -> Site {
        Site {
            latitude: -1.2921,
            longitude: 36.8219,
        }
    }

    #[test]
    fn no_generation_at_night() {
        let pv = SyntheticSolar::new(10_000.0, 13, 37, 0.1, 42);
        let points = pv.forecast(&site(), &grid(14)).unwrap();
        for slot in (0..13).chain(37..48) {
            assert_eq!(points[slot].generation_wh, 0.0, "slot {slot}");
        }
    }

    #[test]
    fn peak_at_solar_noon_without_noise() {
        let pv = SyntheticSolar::new(10_000.0, 12, 36, 0.0, 42);
        let points = pv.forecast(&site(), &grid(14)).unwrap();
        assert!((points[24].generation_wh - 10_000.0).abs() < 1e-2);
        assert!(points[18].generation_wh < points[24].generation_wh);
    }

    #[test]
    fn daylight_curve_is_symmetric() {
        let pv = SyntheticSolar::new(1.0, 12, 36, 0.0, 0);
        assert!((pv.daylight_frac(18) - pv.daylight_frac(30)).abs() < 1e-5);
    }

    #[test]
    fn invalid_daylight_window_yields_zero() {
        let pv = SyntheticSolar::new(1.0, 30, 10, 0.0, 0);
        assert!((0..48).all(|s| pv.daylight_frac(s) == 0.0));
    }

    #[test]
    fn deterministic_for_same_seed_and_day() {
        let pv = SyntheticSolar::new(10_000.0, 13, 37, 0.1, 42);
        let a = pv.forecast(&site(), &grid(14)).unwrap();
        let b = pv.forecast(&site(), &grid(14)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_days_differ() {
        let pv = SyntheticSolar::new(10_000.0, 13, 37, 0.1, 42);
        let a = pv.forecast(&site(), &grid(14)).unwrap();
        let b = pv.forecast(&site(), &grid(15)).unwrap();
        assert!(a.iter().zip(&b).any(|(x, y)| x.generation_wh != y.generation_wh));
    }

    #[test]
    fn timestamps_follow_slot_grid() {
        let pv = SyntheticSolar::new(1.0, 13, 37, 0.0, 0);
        let g = grid(14);
        let points = pv.forecast(&site(), &g).unwrap();
        assert_eq!(points[20].timestamp, g.slot_start(20).fixed_offset());
    }

    #[test]
    fn negative_parameters_clamped() {
        let pv = SyntheticSolar::new(-5.0, 13, 37, -0.1, 0);
        assert_eq!(pv.peak_wh, 0.0);
        assert_eq!(pv.noise_std, 0.0);
    }
}
