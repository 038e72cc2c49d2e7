//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use chrono_tz::Africa::Nairobi;

use solar_shift::catalog::{BaseLoad, Device, LoadCatalog};
use solar_shift::forecast::{ForecastPoint, SlotForecast};
use solar_shift::schedule::types::DayGrid;

/// Fixed target day (2025-03-14, Africa/Nairobi).
pub fn grid() -> DayGrid {
    DayGrid::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(), Nairobi)
}

/// Per-slot generation peaking around 10:00.
///
/// Daylight slots 12..=35 carry 200 Wh; slots 20 and 21 carry 1000 Wh and
/// slots 22 and 23 carry 800 Wh.
pub fn peaked_generation() -> Vec<f32> {
    (0..48)
        .map(|s| match s {
            20 | 21 => 1000.0,
            22 | 23 => 800.0,
            12..=35 => 200.0,
            _ => 0.0,
        })
        .collect()
}

/// [`peaked_generation`] as an aligned forecast.
pub fn peaked_forecast() -> SlotForecast {
    SlotForecast::from_slots(&peaked_generation())
}

/// Raw half-hourly points for `values`, one per slot of [`grid`].
pub fn points(values: &[f32]) -> Vec<ForecastPoint> {
    let g = grid();
    values
        .iter()
        .enumerate()
        .map(|(slot, wh)| ForecastPoint {
            timestamp: g.slot_start(slot).fixed_offset(),
            generation_wh: *wh,
            irradiance_w_m2: None,
        })
        .collect()
}

/// Constant 1 kW base load.
pub fn base_load() -> BaseLoad {
    BaseLoad::constant(1.0)
}

/// Catalog over the shared base load.
pub fn catalog(devices: Vec<Device>) -> LoadCatalog {
    LoadCatalog::new(devices, base_load()).unwrap()
}

/// Device A: 2 kW for one hour, placed first.
pub fn device_a() -> Device {
    Device::controllable("A", 2.0, 2).with_priority(1)
}

/// Device B: 2 kW for one hour, placed second.
pub fn device_b() -> Device {
    Device::controllable("B", 2.0, 2).with_priority(2)
}
