//! Solar-aligned day-ahead load scheduler.
//!
//! Places flexible loads into the half-hour slots of the coming day where
//! predicted solar generation best covers them, then reduces the per-slot
//! schedule into human-readable run intervals.

#[cfg(feature = "api")]
pub mod api;
/// Load catalog: controllable devices and base load.
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod forecast;
/// CSV import and export.
pub mod io;
pub mod runner;
/// Slot grid, scheduler, timeline reducer and KPIs.
pub mod schedule;
pub mod telemetry;
