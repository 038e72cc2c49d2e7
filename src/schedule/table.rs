use chrono::DateTime;
use chrono_tz::Tz;

use super::types::DayGrid;

/// Load breakdown for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRow {
    /// Slot index (0..48).
    pub slot: usize,
    /// Slot start in the grid's zone.
    pub start: DateTime<Tz>,
    /// Predicted generation in the slot (Wh).
    pub generation_wh: f32,
    /// Base load drawn in the slot (kW).
    pub base_kw: f32,
    /// Draw of each scheduled device (kW), in [`ScheduleTable::devices`] order.
    pub device_kw: Vec<f32>,
    /// Base load plus every device draw (kW).
    pub total_kw: f32,
}

impl SlotRow {
    /// Returns `true` if the device at `index` draws power in this slot.
    pub fn is_active(&self, index: usize) -> bool {
        self.device_kw.get(index).is_some_and(|kw| *kw > 0.0)
    }
}

/// The canonical per-slot schedule: 48 rows, one column per device.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleTable {
    grid: DayGrid,
    devices: Vec<String>,
    rows: Vec<SlotRow>,
}

impl ScheduleTable {
    pub(crate) fn new(grid: DayGrid, devices: Vec<String>, rows: Vec<SlotRow>) -> Self {
        Self {
            grid,
            devices,
            rows,
        }
    }

    /// The day this table covers.
    pub fn grid(&self) -> &DayGrid {
        &self.grid
    }

    /// Scheduled device names, in catalog order.
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// All rows in slot order.
    pub fn rows(&self) -> &[SlotRow] {
        &self.rows
    }

    /// Per-slot draw of one device, or `None` if it is not in the table.
    pub fn column(&self, device: &str) -> Option<Vec<f32>> {
        let index = self.devices.iter().position(|d| d == device)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.device_kw.get(index).copied().unwrap_or(0.0))
                .collect(),
        )
    }

    /// Per-slot total draw (kW).
    pub fn total_kw(&self) -> Vec<f32> {
        self.rows.iter().map(|r| r.total_kw).collect()
    }
}
