//! Greedy solar-aligned placement of controllable loads.

use tracing::{debug, info, warn};

use super::capacity::CapacityLedger;
use super::table::{ScheduleTable, SlotRow};
use super::types::{DayGrid, SLOT_HOURS, SLOTS_PER_DAY};
use crate::catalog::{Device, LoadCatalog};
use crate::error::InvalidConstraint;
use crate::forecast::SlotForecast;

/// Reported when a run places no controllable device.
pub const NO_CONTROLLABLE_LOADS: &str = "No controllable loads were scheduled";

/// Where one controllable device was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Device name.
    pub device: String,
    /// First active slot.
    pub start_slot: usize,
    /// Run length in slots.
    pub duration_slots: usize,
    /// Draw while active (kW).
    pub power_kw: f32,
    /// Generation minus load of devices placed earlier over the run, at
    /// placement time (Wh).
    pub score_wh: f32,
    /// `true` when no window fit under the ceiling and the device was
    /// placed at its best window anyway.
    pub over_capacity: bool,
}

impl Placement {
    /// First slot after the run (exclusive).
    pub fn end_slot(&self) -> usize {
        self.start_slot + self.duration_slots
    }

    /// Returns `true` if the device is active in `slot`.
    pub fn covers(&self, slot: usize) -> bool {
        (self.start_slot..self.end_slot()).contains(&slot)
    }
}

/// Outcome of one scheduling run.
///
/// Per-device constraint errors are reported next to the assignment: a
/// rejected device is absent from the table while every other device is
/// still placed.
#[derive(Debug, Clone)]
pub struct ScheduleReport {
    /// Per-slot load table.
    pub table: ScheduleTable,
    /// Placed devices, in catalog order.
    pub placements: Vec<Placement>,
    /// Devices excluded because their constraints cannot be met.
    pub rejected: Vec<InvalidConstraint>,
    /// Slots the forecast did not cover (scheduled as zero generation).
    pub forecast_gaps: Vec<usize>,
}

impl ScheduleReport {
    /// Returns `true` if at least one controllable device was placed.
    pub fn has_controllable_loads(&self) -> bool {
        !self.placements.is_empty()
    }

    /// Placement of `device`, if it was scheduled.
    pub fn placement(&self, device: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.device == device)
    }
}

/// Greedy day-ahead scheduler.
///
/// Devices are placed one at a time in priority order (lower value first,
/// catalog order between equals). Each device takes the contiguous window
/// that maximises predicted generation minus the load of devices already
/// placed in those slots; ties go to the earliest start. Base load does not
/// enter the score but does count against the ceiling. The chosen load is
/// committed before the next device is considered.
///
/// With a capacity ceiling, a device takes its best window that keeps every
/// slot within the ceiling. If no such window exists it is still placed at
/// its best window overall and flagged `over_capacity`; devices are never
/// dropped for lack of supply.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    capacity_kw: Option<f32>,
}

impl Scheduler {
    /// Creates a scheduler with an optional per-slot ceiling on total draw.
    /// A non-positive ceiling means no limit.
    pub fn new(capacity_kw: Option<f32>) -> Self {
        Self {
            capacity_kw: capacity_kw.filter(|kw| kw.is_finite() && *kw > 0.0),
        }
    }

    /// Scheduler without a ceiling.
    pub fn unconstrained() -> Self {
        Self::new(None)
    }

    /// Configured ceiling (kW).
    pub fn capacity_kw(&self) -> Option<f32> {
        self.capacity_kw
    }

    /// Places every controllable device of `catalog` on `grid`'s day.
    pub fn schedule(
        &self,
        grid: &DayGrid,
        forecast: &SlotForecast,
        catalog: &LoadCatalog,
    ) -> ScheduleReport {
        let devices = catalog.controllable();
        let mut ledger = CapacityLedger::with_ceiling(self.capacity_kw);
        ledger.commit_base(catalog.base_load().profile_kw());

        let mut order: Vec<usize> = (0..devices.len()).collect();
        order.sort_by_key(|&i| (devices[i].priority, i));

        let mut placed: Vec<Option<Placement>> = vec![None; devices.len()];
        let mut rejected = Vec::new();

        for i in order {
            let device = &devices[i];
            match place(device, forecast, &ledger) {
                Ok(placement) => {
                    ledger.commit(
                        placement.start_slot,
                        placement.duration_slots,
                        placement.power_kw,
                    );
                    placed[i] = Some(placement);
                }
                Err(err) => {
                    warn!(device = %device.name, error = %err, "device excluded from schedule");
                    rejected.push(err);
                }
            }
        }

        let placements: Vec<Placement> = placed.into_iter().flatten().collect();
        let table = build_table(grid, forecast, catalog, &placements);

        info!(
            date = %grid.date(),
            placed = placements.len(),
            rejected = rejected.len(),
            within_ceiling = ledger.within_limits(),
            "schedule built"
        );

        ScheduleReport {
            table,
            placements,
            rejected,
            forecast_gaps: forecast.missing_slots().to_vec(),
        }
    }
}

fn place(
    device: &Device,
    forecast: &SlotForecast,
    ledger: &CapacityLedger,
) -> Result<Placement, InvalidConstraint> {
    let window = device.allowed_window()?;
    let duration = device.duration_slots;

    let mut best_any: Option<(usize, f32)> = None;
    let mut best_fit: Option<(usize, f32)> = None;
    for start in window.start_slots(duration) {
        let score = window_score(forecast, ledger, start, duration);
        if best_any.is_none_or(|(_, s)| score > s) {
            best_any = Some((start, score));
        }
        if ledger.fits(start, duration, device.power_kw) && best_fit.is_none_or(|(_, s)| score > s)
        {
            best_fit = Some((start, score));
        }
    }

    let (start_slot, score_wh, over_capacity) = match (best_fit, best_any) {
        (Some((start, score)), _) => (start, score, false),
        (None, Some((start, score))) => {
            warn!(
                device = %device.name,
                start_slot = start,
                ceiling_kw = ?ledger.ceiling_kw(),
                "no window fits under the ceiling; placing at best window"
            );
            (start, score, true)
        }
        (None, None) => {
            return Err(InvalidConstraint::DurationExceedsWindow {
                device: device.name.clone(),
                duration_slots: duration,
                window_slots: window.len(),
            });
        }
    };

    debug!(
        device = %device.name,
        priority = device.priority,
        start_slot,
        duration_slots = duration,
        score_wh,
        "device placed"
    );

    Ok(Placement {
        device: device.name.clone(),
        start_slot,
        duration_slots: duration,
        power_kw: device.power_kw,
        score_wh,
        over_capacity,
    })
}

/// Predicted generation minus load from already-placed devices over a run
/// (Wh). Base load is left out so it cannot steer placement.
fn window_score(
    forecast: &SlotForecast,
    ledger: &CapacityLedger,
    start: usize,
    duration: usize,
) -> f32 {
    (start..start + duration)
        .map(|slot| {
            forecast.generation_wh(slot) - ledger.device_kw(slot) * SLOT_HOURS * 1000.0
        })
        .sum()
}

fn build_table(
    grid: &DayGrid,
    forecast: &SlotForecast,
    catalog: &LoadCatalog,
    placements: &[Placement],
) -> ScheduleTable {
    let devices = placements.iter().map(|p| p.device.clone()).collect();
    let rows = (0..SLOTS_PER_DAY)
        .map(|slot| {
            let base_kw = catalog.base_load().kw_at(slot);
            let device_kw: Vec<f32> = placements
                .iter()
                .map(|p| if p.covers(slot) { p.power_kw } else { 0.0 })
                .collect();
            let total_kw = base_kw + device_kw.iter().sum::<f32>();
            SlotRow {
                slot,
                start: grid.slot_start(slot),
                generation_wh: forecast.generation_wh(slot),
                base_kw,
                device_kw,
                total_kw,
            }
        })
        .collect();
    ScheduleTable::new(*grid, devices, rows)
}
