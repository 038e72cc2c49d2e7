//! API response and query types.
//!
//! Field names follow the CSV export columns so both outputs read the
//! same way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InvalidConstraint;
use crate::forecast::ForecastSummary;
use crate::schedule::engine::Placement;
use crate::schedule::kpi::ScheduleKpi;
use crate::schedule::table::{ScheduleTable, SlotRow};
use crate::schedule::timeline::Interval;

/// One slot of the schedule table.
#[derive(Debug, Serialize)]
pub struct ScheduleRecord {
    /// Slot start (RFC 3339, site zone).
    pub timestamp: String,
    /// Slot index.
    pub slot: usize,
    /// Predicted generation (Wh).
    pub generation_wh: f32,
    /// Base load (kW).
    pub base_load_kw: f32,
    /// Draw per scheduled device (kW).
    pub loads_kw: BTreeMap<String, f32>,
    /// Total draw (kW).
    pub total_load_kw: f32,
}

impl ScheduleRecord {
    /// Maps one table row, naming its device columns from `table`.
    pub fn from_row(table: &ScheduleTable, row: &SlotRow) -> Self {
        Self {
            timestamp: row.start.to_rfc3339(),
            slot: row.slot,
            generation_wh: row.generation_wh,
            base_load_kw: row.base_kw,
            loads_kw: table
                .devices()
                .iter()
                .cloned()
                .zip(row.device_kw.iter().copied())
                .collect(),
            total_load_kw: row.total_kw,
        }
    }
}

/// One contiguous device run.
#[derive(Debug, Serialize)]
pub struct IntervalRecord {
    /// Catalog device name.
    pub device: String,
    /// Display label.
    pub label: String,
    /// Run start (RFC 3339).
    pub start: String,
    /// Run end, exclusive (RFC 3339).
    pub end: String,
    /// Run length in minutes.
    pub duration_min: i64,
}

impl From<&Interval> for IntervalRecord {
    fn from(i: &Interval) -> Self {
        Self {
            device: i.device.clone(),
            label: i.label(),
            start: i.start.to_rfc3339(),
            end: i.end.to_rfc3339(),
            duration_min: i.duration_minutes(),
        }
    }
}

/// Where a device was placed.
#[derive(Debug, Serialize)]
pub struct PlacementRecord {
    /// Device name.
    pub device: String,
    /// First active slot.
    pub start_slot: usize,
    /// First slot after the run.
    pub end_slot: usize,
    /// Draw while active (kW).
    pub power_kw: f32,
    /// Placement score (Wh).
    pub score_wh: f32,
    /// Placed above the ceiling.
    pub over_capacity: bool,
}

impl From<&Placement> for PlacementRecord {
    fn from(p: &Placement) -> Self {
        Self {
            device: p.device.clone(),
            start_slot: p.start_slot,
            end_slot: p.end_slot(),
            power_kw: p.power_kw,
            score_wh: p.score_wh,
            over_capacity: p.over_capacity,
        }
    }
}

/// A device left out of the schedule.
#[derive(Debug, Serialize)]
pub struct RejectedRecord {
    /// Device name.
    pub device: String,
    /// Why it could not be placed.
    pub reason: String,
}

impl From<&InvalidConstraint> for RejectedRecord {
    fn from(e: &InvalidConstraint) -> Self {
        Self {
            device: e.device().to_string(),
            reason: e.to_string(),
        }
    }
}

/// Run overview: forecast figures, KPIs and per-device outcomes.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Site display name.
    pub site: String,
    /// Target day (YYYY-MM-DD).
    pub date: String,
    /// Reference time zone.
    pub timezone: String,
    /// Ceiling the run used, if any (kW).
    pub capacity_kw: Option<f32>,
    /// Forecast headline figures.
    pub forecast: ForecastSummary,
    /// Schedule KPIs.
    pub kpi: ScheduleKpi,
    /// Placed devices, in catalog order.
    pub placements: Vec<PlacementRecord>,
    /// Devices excluded by their constraints.
    pub rejected: Vec<RejectedRecord>,
    /// Slots without forecast data.
    pub forecast_gaps: Vec<usize>,
    /// Set when nothing controllable was scheduled.
    pub message: Option<String>,
}

/// Optional device filter for the timeline endpoint.
#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    /// Device name or display label.
    pub device: Option<String>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::schedule::types::DayGrid;

    #[test]
    fn interval_record_maps_fields() {
        let grid = DayGrid::new(
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            chrono_tz::Africa::Nairobi,
        );
        let interval = Interval {
            device: "lab_chiller".to_string(),
            start: grid.slot_start(20),
            end: grid.slot_start(26),
        };
        let record = IntervalRecord::from(&interval);
        assert_eq!(record.label, "lab chiller");
        assert_eq!(record.start, "2025-03-14T10:00:00+03:00");
        assert_eq!(record.duration_min, 180);
    }

    #[test]
    fn rejected_record_carries_reason() {
        let err = InvalidConstraint::InvertedWindow {
            device: "x".to_string(),
            earliest: 30,
            latest: 10,
        };
        let record = RejectedRecord::from(&err);
        assert_eq!(record.device, "x");
        assert!(record.reason.contains("after window end"));
    }
}
