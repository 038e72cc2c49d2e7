//! Day-ahead scheduling: slot grid, greedy placement, timeline and KPIs.

/// Per-slot committed load and the optional ceiling.
pub mod capacity;
pub mod engine;
pub mod kpi;
/// Canonical per-slot schedule table.
pub mod table;
pub mod timeline;
pub mod types;

pub use engine::{Placement, ScheduleReport, Scheduler};
pub use kpi::ScheduleKpi;
pub use table::{ScheduleTable, SlotRow};
pub use timeline::Interval;
pub use types::DayGrid;
