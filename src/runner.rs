//! One scheduling run, from raw forecast points to timeline and KPIs.

use tracing::{info, info_span};

use crate::catalog::LoadCatalog;
use crate::error::DataShapeError;
use crate::forecast::{ForecastPoint, ForecastSummary, SlotForecast};
use crate::schedule::engine::{ScheduleReport, Scheduler};
use crate::schedule::kpi::ScheduleKpi;
use crate::schedule::timeline::{self, Interval};
use crate::schedule::types::DayGrid;

/// Everything produced for one target day.
#[derive(Debug, Clone)]
pub struct DayPlan {
    /// Day the plan covers.
    pub grid: DayGrid,
    /// Forecast aligned to the slot grid.
    pub forecast: SlotForecast,
    /// Headline forecast figures.
    pub summary: ForecastSummary,
    /// Placement result and per-slot table.
    pub report: ScheduleReport,
    /// Contiguous runs derived from the table.
    pub timeline: Vec<Interval>,
    /// Aggregate indicators.
    pub kpi: ScheduleKpi,
}

/// Aligns `points` to `grid`, schedules `catalog` and derives the timeline.
///
/// # Errors
///
/// Returns a [`DataShapeError`] when the forecast points are malformed; no
/// partial plan is produced in that case.
pub fn plan_day(
    grid: DayGrid,
    points: &[ForecastPoint],
    cadence_minutes: u32,
    catalog: &LoadCatalog,
    scheduler: &Scheduler,
) -> Result<DayPlan, DataShapeError> {
    let span = info_span!("plan_day", date = %grid.date(), tz = %grid.tz());
    let _enter = span.enter();

    let forecast = SlotForecast::align(points, &grid, cadence_minutes)?;
    let summary = ForecastSummary::from_forecast(&forecast);
    let report = scheduler.schedule(&grid, &forecast, catalog);
    let timeline = timeline::from_table(&report.table);
    let kpi = ScheduleKpi::from_report(&report, scheduler.capacity_kw());

    info!(
        intervals = timeline.len(),
        solar_kwh = kpi.solar_kwh,
        self_sufficiency_pct = kpi.self_sufficiency_pct,
        "day planned"
    );

    Ok(DayPlan {
        grid,
        forecast,
        summary,
        report,
        timeline,
        kpi,
    })
}
