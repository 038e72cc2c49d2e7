//! Solar production forecast: input points, slot alignment and providers.
//!
//! Providers produce raw [`ForecastPoint`]s at their native cadence. Before
//! the scheduler sees them, [`SlotForecast::align`] resolves the time zone
//! once, keeps only the target day, and distributes energy onto the 48-slot
//! grid. Slots nothing covers are zero-filled and reported as gaps.

/// Time-boxed forecast cache keyed by site and day.
pub mod cache;
/// Synthetic clear-sky production curve.
pub mod solar;
/// Headline forecast metrics.
pub mod summary;

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::warn;

use crate::error::{DataShapeError, ForecastError};
use crate::schedule::types::{DayGrid, SLOT_MINUTES, SLOTS_PER_DAY};

pub use cache::ForecastCache;
pub use solar::SyntheticSolar;
pub use summary::ForecastSummary;

/// One sample of predicted production.
///
/// `generation_wh` is the energy expected over `[timestamp, timestamp +
/// cadence)`; `irradiance_w_m2` is the mean plane-of-array irradiance over
/// the same interval, when the provider has it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastPoint {
    /// Start of the sampled interval.
    pub timestamp: DateTime<FixedOffset>,
    /// Predicted energy over the interval (Wh).
    pub generation_wh: f32,
    /// Mean irradiance over the interval (W/m²).
    #[serde(default)]
    pub irradiance_w_m2: Option<f32>,
}

/// Location a forecast is produced for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Source of raw forecast points for a site and day.
pub trait ForecastProvider {
    /// Returns a short provider name for logs and errors.
    fn name(&self) -> &'static str;

    /// Produces the raw points for `grid`'s day.
    ///
    /// # Errors
    ///
    /// Returns a [`ForecastError`] when the provider cannot produce data.
    fn forecast(&self, site: &Site, grid: &DayGrid) -> Result<Vec<ForecastPoint>, ForecastError>;
}

/// Forecast read from a CSV file (`timestamp,generation_wh[,irradiance_w_m2]`).
///
/// A file with no point on the requested day is reported as unavailable
/// rather than scheduled as an all-dark day.
#[derive(Debug, Clone)]
pub struct CsvForecast {
    /// Path of the CSV file.
    pub path: PathBuf,
}

impl ForecastProvider for CsvForecast {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn forecast(&self, _site: &Site, grid: &DayGrid) -> Result<Vec<ForecastPoint>, ForecastError> {
        let points = crate::io::import::load_forecast_csv(&self.path)?;
        if !points.iter().any(|p| grid.slot_of(&p.timestamp).is_some()) {
            return Err(ForecastError::Unavailable {
                provider: self.name(),
                day: grid.date(),
            });
        }
        Ok(points)
    }
}

/// Configured forecast source.
#[derive(Debug, Clone)]
pub enum ForecastSource {
    /// Deterministic synthetic curve.
    Synthetic(SyntheticSolar),
    /// Points from a CSV file.
    Csv(CsvForecast),
}

impl ForecastProvider for ForecastSource {
    fn name(&self) -> &'static str {
        match self {
            Self::Synthetic(p) => p.name(),
            Self::Csv(p) => p.name(),
        }
    }

    fn forecast(&self, site: &Site, grid: &DayGrid) -> Result<Vec<ForecastPoint>, ForecastError> {
        match self {
            Self::Synthetic(p) => p.forecast(site, grid),
            Self::Csv(p) => p.forecast(site, grid),
        }
    }
}

/// Predicted generation for each of the 48 slots of one day.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotForecast {
    generation_wh: Vec<f32>,
    irradiance_w_m2: Option<Vec<f32>>,
    missing_slots: Vec<usize>,
}

impl SlotForecast {
    /// Wraps already-aligned per-slot values.
    ///
    /// Shorter input is zero-filled and the missing tail is reported as a
    /// gap; longer input is truncated.
    pub fn from_slots(values: &[f32]) -> Self {
        let mut generation_wh = values.to_vec();
        generation_wh.truncate(SLOTS_PER_DAY);
        let missing_slots = (generation_wh.len()..SLOTS_PER_DAY).collect();
        generation_wh.resize(SLOTS_PER_DAY, 0.0);
        Self {
            generation_wh,
            irradiance_w_m2: None,
            missing_slots,
        }
    }

    /// Resamples raw points onto `grid`.
    ///
    /// Each point is treated as covering `[timestamp, timestamp +
    /// cadence_minutes)`, measured in absolute time from the grid's day
    /// start, the same way [`DayGrid::slot_start`] lays out slots. Its energy is split across the slots it overlaps
    /// in proportion to the overlap, so finer samples are summed into their
    /// slot and coarser samples are spread evenly. Irradiance is averaged
    /// over the overlap. Points outside the day contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`DataShapeError`] for a zero cadence, a non-finite value
    /// or duplicate timestamps.
    pub fn align(
        points: &[ForecastPoint],
        grid: &DayGrid,
        cadence_minutes: u32,
    ) -> Result<Self, DataShapeError> {
        if cadence_minutes == 0 {
            return Err(DataShapeError::InvalidValue {
                record: "forecast".to_string(),
                field: "cadence_minutes",
                message: "must be > 0".to_string(),
            });
        }
        let cadence = i64::from(cadence_minutes);
        let day_start = grid.day_start();

        let mut generation_wh = vec![0.0_f32; SLOTS_PER_DAY];
        let mut covered_min = vec![0_i64; SLOTS_PER_DAY];
        let mut irr_weighted = vec![0.0_f32; SLOTS_PER_DAY];
        let mut irr_min = vec![0_i64; SLOTS_PER_DAY];
        let mut seen = HashSet::new();

        for p in points {
            let stamp = p.timestamp.to_rfc3339();
            if !p.generation_wh.is_finite() || p.irradiance_w_m2.is_some_and(|v| !v.is_finite()) {
                return Err(DataShapeError::InvalidValue {
                    record: format!("forecast {stamp}"),
                    field: "generation_wh",
                    message: "must be finite".to_string(),
                });
            }
            if !seen.insert(p.timestamp) {
                return Err(DataShapeError::InvalidValue {
                    record: format!("forecast {stamp}"),
                    field: "timestamp",
                    message: "duplicate timestamp".to_string(),
                });
            }

            let from = (p.timestamp.with_timezone(&grid.tz()) - day_start).num_minutes();
            let to = from + cadence;
            for (slot, gen_slot) in generation_wh.iter_mut().enumerate() {
                let slot_from = slot as i64 * SLOT_MINUTES;
                let overlap = to.min(slot_from + SLOT_MINUTES) - from.max(slot_from);
                if overlap <= 0 {
                    continue;
                }
                let share = overlap as f32 / cadence as f32;
                *gen_slot += p.generation_wh * share;
                covered_min[slot] += overlap;
                if let Some(irr) = p.irradiance_w_m2 {
                    irr_weighted[slot] += irr * overlap as f32;
                    irr_min[slot] += overlap;
                }
            }
        }

        let missing_slots: Vec<usize> = (0..SLOTS_PER_DAY).filter(|s| covered_min[*s] == 0).collect();
        if !missing_slots.is_empty() {
            warn!(
                date = %grid.date(),
                missing = missing_slots.len(),
                "forecast does not cover every slot; treating gaps as zero generation"
            );
        }

        let irradiance_w_m2 = irr_min.iter().any(|m| *m > 0).then(|| {
            irr_weighted
                .iter()
                .zip(&irr_min)
                .map(|(w, m)| if *m > 0 { w / *m as f32 } else { 0.0 })
                .collect()
        });

        Ok(Self {
            generation_wh,
            irradiance_w_m2,
            missing_slots,
        })
    }

    /// Predicted generation at `slot` (Wh); zero outside the day.
    pub fn generation_wh(&self, slot: usize) -> f32 {
        self.generation_wh.get(slot).copied().unwrap_or(0.0)
    }

    /// All 48 slot values (Wh).
    pub fn values(&self) -> &[f32] {
        &self.generation_wh
    }

    /// Per-slot irradiance (W/m²), when the source supplied it.
    pub fn irradiance_w_m2(&self) -> Option<&[f32]> {
        self.irradiance_w_m2.as_deref()
    }

    /// Slots that no input point covered.
    pub fn missing_slots(&self) -> &[usize] {
        &self.missing_slots
    }

    /// `true` when every slot was covered by input data.
    pub fn is_complete(&self) -> bool {
        self.missing_slots.is_empty()
    }

    /// Total predicted generation over the day (Wh).
    pub fn total_wh(&self) -> f32 {
        self.generation_wh.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use chrono_tz::Africa::Nairobi;

    fn grid() -> DayGrid {
        DayGrid::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(), Nairobi)
    }

    fn point(grid: &DayGrid, minutes: i64, wh: f32) -> ForecastPoint {
        ForecastPoint {
            timestamp: (grid.day_start() + Duration::minutes(minutes)).fixed_offset(),
            generation_wh: wh,
            irradiance_w_m2: None,
        }
    }

    #[test]
    fn half_hourly_points_map_one_to_one() {
        let g = grid();
        let points: Vec<_> = (0..48).map(|s| point(&g, s * 30, s as f32)).collect();
        let f = SlotForecast::align(&points, &g, 30).unwrap();
        assert!(f.is_complete());
        assert_eq!(f.generation_wh(21), 21.0);
    }

    #[test]
    fn hourly_points_split_evenly() {
        let g = grid();
        let points: Vec<_> = (0..24).map(|h| point(&g, h * 60, 100.0)).collect();
        let f = SlotForecast::align(&points, &g, 60).unwrap();
        assert!(f.is_complete());
        assert_eq!(f.generation_wh(0), 50.0);
        assert_eq!(f.generation_wh(47), 50.0);
        assert_eq!(f.total_wh(), 2400.0);
    }

    #[test]
    fn quarter_hour_points_are_summed() {
        let g = grid();
        let points: Vec<_> = (0..96).map(|q| point(&g, q * 15, 10.0)).collect();
        let f = SlotForecast::align(&points, &g, 15).unwrap();
        assert_eq!(f.generation_wh(5), 20.0);
    }

    #[test]
    fn gaps_are_zero_filled_and_reported() {
        let g = grid();
        let points: Vec<_> = (0..40).map(|s| point(&g, s * 30, 5.0)).collect();
        let f = SlotForecast::align(&points, &g, 30).unwrap();
        assert_eq!(f.missing_slots(), (40..48).collect::<Vec<usize>>().as_slice());
        assert_eq!(f.generation_wh(45), 0.0);
    }

    #[test]
    fn points_from_other_days_are_ignored() {
        let g = grid();
        let points = vec![point(&g, -30, 99.0), point(&g, 24 * 60, 99.0), point(&g, 0, 1.0)];
        let f = SlotForecast::align(&points, &g, 30).unwrap();
        assert_eq!(f.total_wh(), 1.0);
    }

    #[test]
    fn utc_timestamps_resolved_into_grid_zone() {
        let g = grid();
        // 07:00 UTC is 10:00 in Nairobi, slot 20.
        let p = ForecastPoint {
            timestamp: DateTime::parse_from_rfc3339("2025-03-14T07:00:00+00:00").unwrap(),
            generation_wh: 500.0,
            irradiance_w_m2: Some(800.0),
        };
        let f = SlotForecast::align(&[p], &g, 30).unwrap();
        assert_eq!(f.generation_wh(20), 500.0);
        assert_eq!(f.irradiance_w_m2().map(|v| v[20]), Some(800.0));
    }

    #[test]
    fn dst_gap_day_maps_points_onto_slot_starts() {
        let g = DayGrid::new(
            NaiveDate::from_ymd_opt(2025, 3, 30).unwrap(),
            chrono_tz::Europe::Berlin,
        );
        let p = ForecastPoint {
            timestamp: DateTime::parse_from_rfc3339("2025-03-30T03:00:00+02:00").unwrap(),
            generation_wh: 40.0,
            irradiance_w_m2: None,
        };
        let f = SlotForecast::align(&[p.clone()], &g, 30).unwrap();
        assert_eq!(f.generation_wh(4), 40.0);
        assert_eq!(g.slot_start(4), p.timestamp);
    }

    #[test]
    fn non_finite_generation_rejected() {
        let g = grid();
        let err = SlotForecast::align(&[point(&g, 0, f32::NAN)], &g, 30);
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_timestamps_rejected() {
        let g = grid();
        let err = SlotForecast::align(&[point(&g, 60, 1.0), point(&g, 60, 2.0)], &g, 30);
        assert!(err.is_err());
    }

    #[test]
    fn zero_cadence_rejected() {
        let g = grid();
        assert!(SlotForecast::align(&[], &g, 0).is_err());
    }

    #[test]
    fn short_slot_input_reports_tail_gap() {
        let f = SlotForecast::from_slots(&[1.0; 46]);
        assert_eq!(f.values().len(), SLOTS_PER_DAY);
        assert_eq!(f.missing_slots(), &[46, 47]);
    }
}
