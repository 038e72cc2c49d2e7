//! Post-hoc KPI computation from a schedule report.

use std::fmt;

use serde::Serialize;

use super::engine::ScheduleReport;
use super::types::{SLOT_HOURS, slot_label};

/// Aggregate indicators derived from a finished schedule.
///
/// Computed from the table rows rather than tracked during placement, so
/// the figures always agree with what is exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleKpi {
    /// Total consumption over the day, base load included (kWh).
    pub load_kwh: f32,
    /// Energy drawn by controllable devices (kWh).
    pub shifted_kwh: f32,
    /// Predicted generation over the day (kWh).
    pub solar_kwh: f32,
    /// Consumption covered by same-slot generation, `Σ min(gen, load)` (kWh).
    pub solar_covered_kwh: f32,
    /// Share of consumption covered by generation (%).
    pub self_sufficiency_pct: f32,
    /// Highest slot total (kW).
    pub peak_load_kw: f32,
    /// Slot of the highest total, earliest on ties.
    pub peak_load_slot: usize,
    /// Slots whose total exceeds the ceiling (0 without a ceiling).
    pub slots_over_capacity: usize,
    /// Devices placed above the ceiling.
    pub devices_over_capacity: usize,
}

impl ScheduleKpi {
    /// Computes all KPIs from a report.
    ///
    /// # Arguments
    ///
    /// * `report` - Finished scheduling run
    /// * `capacity_kw` - Ceiling the run was scheduled under, if any
    pub fn from_report(report: &ScheduleReport, capacity_kw: Option<f32>) -> Self {
        let mut load_kwh = 0.0_f32;
        let mut shifted_kwh = 0.0_f32;
        let mut solar_kwh = 0.0_f32;
        let mut covered_kwh = 0.0_f32;
        let mut peak_load_kw = 0.0_f32;
        let mut peak_load_slot = 0_usize;
        let mut slots_over = 0_usize;

        for row in report.table.rows() {
            let load = row.total_kw * SLOT_HOURS;
            let generation = row.generation_wh / 1000.0;
            load_kwh += load;
            shifted_kwh += row.device_kw.iter().sum::<f32>() * SLOT_HOURS;
            solar_kwh += generation;
            covered_kwh += generation.min(load);

            if row.total_kw > peak_load_kw {
                peak_load_kw = row.total_kw;
                peak_load_slot = row.slot;
            }
            if capacity_kw.is_some_and(|cap| row.total_kw > cap + 1e-4) {
                slots_over += 1;
            }
        }

        let self_sufficiency_pct = if load_kwh > 0.0 {
            100.0 * covered_kwh / load_kwh
        } else {
            0.0
        };

        Self {
            load_kwh,
            shifted_kwh,
            solar_kwh,
            solar_covered_kwh: covered_kwh,
            self_sufficiency_pct,
            peak_load_kw,
            peak_load_slot,
            slots_over_capacity: slots_over,
            devices_over_capacity: report
                .placements
                .iter()
                .filter(|p| p.over_capacity)
                .count(),
        }
    }
}

impl fmt::Display for ScheduleKpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Schedule KPIs ---")?;
        writeln!(f, "Total load:            {:.2} kWh", self.load_kwh)?;
        writeln!(f, "Shifted load:          {:.2} kWh", self.shifted_kwh)?;
        writeln!(f, "Solar forecast:        {:.2} kWh", self.solar_kwh)?;
        writeln!(
            f,
            "Solar-covered load:    {:.2} kWh ({:.1}% self-sufficiency)",
            self.solar_covered_kwh, self.self_sufficiency_pct
        )?;
        writeln!(
            f,
            "Peak load:             {:.2} kW at {}",
            self.peak_load_kw,
            slot_label(self.peak_load_slot)
        )?;
        write!(
            f,
            "Over capacity:         {} slots, {} devices",
            self.slots_over_capacity, self.devices_over_capacity
        )
    }
}
