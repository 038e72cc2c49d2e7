//! Device records and window constraints.

use serde::Deserialize;

use crate::error::{DataShapeError, InvalidConstraint};
use crate::schedule::types::SLOTS_PER_DAY;

/// Whether a device can be moved by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Load whose run can be placed anywhere inside its window.
    #[default]
    Controllable,
    /// Fixed consumption present in every slot.
    Base,
}

/// Inclusive range of slots a device's run must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    /// Earliest permissible slot (inclusive).
    pub earliest: usize,
    /// Latest permissible slot (inclusive).
    pub latest: usize,
}

impl SlotWindow {
    /// Creates a window covering `earliest..=latest`.
    pub fn new(earliest: usize, latest: usize) -> Self {
        Self { earliest, latest }
    }

    /// The whole day.
    pub fn full_day() -> Self {
        Self::new(0, SLOTS_PER_DAY - 1)
    }

    /// Number of slots in the window.
    pub fn len(&self) -> usize {
        self.latest.saturating_sub(self.earliest) + 1
    }

    /// Always `false`: a window holds at least one slot.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Start slots of every contiguous run of `duration` inside the window.
    pub fn start_slots(&self, duration: usize) -> std::ops::RangeInclusive<usize> {
        self.earliest..=(self.latest + 1).saturating_sub(duration)
    }
}

/// Column header a device gets in the schedule table (`<name>_kW`).
pub fn column_name(device: &str) -> String {
    format!("{device}_kW")
}

/// One entry of the load catalog.
///
/// Power draw is constant while active; devices are either on or off.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Unique identifier.
    pub name: String,
    /// Draw while active (kW).
    pub power_kw: f32,
    /// Required contiguous run length in slots.
    pub duration_slots: usize,
    /// Allowed window, or `None` for the whole day.
    pub window: Option<SlotWindow>,
    /// Placement order key; lower values are placed first.
    pub priority: u32,
    /// Controllable or base load.
    pub kind: DeviceKind,
}

impl Device {
    /// Creates a controllable device with no window and priority 0.
    pub fn controllable(name: impl Into<String>, power_kw: f32, duration_slots: usize) -> Self {
        Self {
            name: name.into(),
            power_kw,
            duration_slots,
            window: None,
            priority: 0,
            kind: DeviceKind::Controllable,
        }
    }

    /// Creates a base-load pseudo-device drawing `power_kw` in every slot.
    pub fn base(name: impl Into<String>, power_kw: f32) -> Self {
        Self {
            name: name.into(),
            power_kw,
            duration_slots: SLOTS_PER_DAY,
            window: None,
            priority: 0,
            kind: DeviceKind::Base,
        }
    }

    /// Restricts the run to `earliest..=latest`.
    pub fn with_window(mut self, earliest: usize, latest: usize) -> Self {
        self.window = Some(SlotWindow::new(earliest, latest));
        self
    }

    /// Sets the placement priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns `true` for base-load entries.
    pub fn is_base(&self) -> bool {
        self.kind == DeviceKind::Base
    }

    /// Resolves the window the run may occupy.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidConstraint`] when the window is inverted,
    /// reaches past the last slot, or is shorter than the run.
    pub fn allowed_window(&self) -> Result<SlotWindow, InvalidConstraint> {
        let window = self.window.unwrap_or_else(SlotWindow::full_day);
        if window.earliest > window.latest {
            return Err(InvalidConstraint::InvertedWindow {
                device: self.name.clone(),
                earliest: window.earliest,
                latest: window.latest,
            });
        }
        if window.latest >= SLOTS_PER_DAY {
            return Err(InvalidConstraint::WindowOutOfRange {
                device: self.name.clone(),
                earliest: window.earliest,
                latest: window.latest,
            });
        }
        if self.duration_slots > window.len() {
            return Err(InvalidConstraint::DurationExceedsWindow {
                device: self.name.clone(),
                duration_slots: self.duration_slots,
                window_slots: window.len(),
            });
        }
        Ok(window)
    }
}

/// Raw catalog row as read from CSV or TOML.
///
/// Every field is optional at parse time so that missing values surface
/// as a [`DataShapeError`] naming the field, rather than a generic
/// deserializer message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceRecord {
    /// Unique device name.
    pub name: Option<String>,
    /// Draw while active (kW).
    pub power_kw: Option<f32>,
    /// Required run length (slots). Ignored for base load.
    pub duration_slots: Option<usize>,
    /// Earliest permissible slot (inclusive).
    pub earliest_slot: Option<usize>,
    /// Latest permissible slot (inclusive).
    pub latest_slot: Option<usize>,
    /// Placement priority (lower = placed first). Ignored for base load.
    pub priority: Option<u32>,
    /// `controllable` (default) or `base`.
    pub kind: Option<DeviceKind>,
}

impl DeviceRecord {
    /// Converts the record into a [`Device`].
    ///
    /// `position` identifies the record in error messages when the name
    /// itself is missing.
    ///
    /// # Errors
    ///
    /// Returns a [`DataShapeError`] for missing required fields or
    /// non-positive power and duration values.
    pub fn into_device(self, position: usize) -> Result<Device, DataShapeError> {
        let name = match self.name.map(|n| n.trim().to_string()) {
            Some(n) if !n.is_empty() => n,
            _ => {
                return Err(DataShapeError::MissingField {
                    record: format!("device #{position}"),
                    field: "name",
                });
            }
        };
        let power_kw = self.power_kw.ok_or_else(|| missing(&name, "power_kw"))?;
        if !power_kw.is_finite() || power_kw <= 0.0 {
            return Err(DataShapeError::InvalidValue {
                record: name,
                field: "power_kw",
                message: format!("must be a positive number, got {power_kw}"),
            });
        }

        let kind = self.kind.unwrap_or_default();
        if kind == DeviceKind::Base {
            return Ok(Device::base(name, power_kw));
        }

        let duration_slots = self
            .duration_slots
            .ok_or_else(|| missing(&name, "duration_slots"))?;
        if duration_slots == 0 {
            return Err(DataShapeError::InvalidValue {
                record: name,
                field: "duration_slots",
                message: "must be > 0".to_string(),
            });
        }
        let priority = self.priority.ok_or_else(|| missing(&name, "priority"))?;

        let window = match (self.earliest_slot, self.latest_slot) {
            (None, None) => None,
            (earliest, latest) => Some(SlotWindow::new(
                earliest.unwrap_or(0),
                latest.unwrap_or(SLOTS_PER_DAY - 1),
            )),
        };

        Ok(Device {
            name,
            power_kw,
            duration_slots,
            window,
            priority,
            kind,
        })
    }
}

fn missing(name: &str, field: &'static str) -> DataShapeError {
    DataShapeError::MissingField {
        record: name.to_string(),
        field,
    }
}
