//! Reduces the per-slot activity table into contiguous run intervals.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use super::table::ScheduleTable;
use super::types::{DayGrid, SLOT_MINUTES};

/// One contiguous run of a device, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Device name as it appears in the catalog.
    pub device: String,
    /// First active instant (inclusive).
    pub start: DateTime<Tz>,
    /// First instant after the run (exclusive).
    pub end: DateTime<Tz>,
}

impl Interval {
    /// Run length in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Returns `true` if `at` falls inside the run.
    pub fn contains(&self, at: &DateTime<Tz>) -> bool {
        self.start <= *at && *at < self.end
    }

    /// Display name: `_kW` suffix dropped, underscores shown as spaces.
    pub fn label(&self) -> String {
        self.device
            .strip_suffix("_kW")
            .unwrap_or(&self.device)
            .replace('_', " ")
    }
}

/// Activity flags for every device at one slot start.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    /// Slot start.
    pub start: DateTime<Tz>,
    /// One flag per device, in the order of the device list.
    pub active: Vec<bool>,
}

/// Turns per-slot activity into intervals.
///
/// Rows are scanned in chronological order. A run opens on an
/// inactive-to-active transition and closes one slot after its last active
/// row; a run still active at the final row closes one slot after it, which
/// is the end of the day when the rows reach slot 47.
/// Rows that do not follow on from the previous one break any open run.
/// Intervals starting outside the day are discarded. Output is grouped by
/// device in `devices` order, chronological within each device.
pub fn reduce(devices: &[String], rows: &[ActivityRow], grid: &DayGrid) -> Vec<Interval> {
    let mut rows: Vec<&ActivityRow> = rows.iter().collect();
    rows.sort_by_key(|r| r.start);

    let slot = Duration::minutes(SLOT_MINUTES);

    let mut intervals = Vec::new();
    for (index, device) in devices.iter().enumerate() {
        let mut open: Option<DateTime<Tz>> = None;
        let mut prev: Option<DateTime<Tz>> = None;

        for row in &rows {
            let active = row.active.get(index).copied().unwrap_or(false);
            let contiguous = prev.is_some_and(|p| p + slot == row.start);

            if let (Some(start), Some(p)) = (open, prev) {
                if !active || !contiguous {
                    intervals.push(Interval {
                        device: device.clone(),
                        start,
                        end: p + slot,
                    });
                    open = None;
                }
            }
            if active && open.is_none() {
                open = Some(row.start);
            }
            prev = Some(row.start);
        }
        if let (Some(start), Some(p)) = (open, prev) {
            intervals.push(Interval {
                device: device.clone(),
                start,
                end: p + slot,
            });
        }
    }

    intervals.retain(|i| grid.slot_of(&i.start).is_some());
    intervals
}

/// Intervals for every scheduled device of a table.
pub fn from_table(table: &ScheduleTable) -> Vec<Interval> {
    let rows: Vec<ActivityRow> = table
        .rows()
        .iter()
        .map(|r| ActivityRow {
            start: r.start,
            active: (0..table.devices().len()).map(|i| r.is_active(i)).collect(),
        })
        .collect();
    reduce(table.devices(), &rows, table.grid())
}

/// Expands intervals back into per-slot activity flags (`[slot][device]`).
pub fn rasterize(devices: &[String], intervals: &[Interval], grid: &DayGrid) -> Vec<Vec<bool>> {
    (0..super::types::SLOTS_PER_DAY)
        .map(|slot| {
            let at = grid.slot_start(slot);
            devices
                .iter()
                .map(|d| intervals.iter().any(|i| &i.device == d && i.contains(&at)))
                .collect()
        })
        .collect()
}
