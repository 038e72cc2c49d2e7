//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    ErrorResponse, IntervalRecord, PlacementRecord, RejectedRecord, ScheduleRecord,
    SummaryResponse, TimelineQuery,
};
use crate::schedule::engine::NO_CONTROLLABLE_LOADS;

/// Returns the per-slot schedule table.
///
/// `GET /schedule` → 200 + `Vec<ScheduleRecord>` JSON (48 rows)
pub async fn get_schedule(State(state): State<Arc<AppState>>) -> Json<Vec<ScheduleRecord>> {
    let table = &state.plan.report.table;
    Json(
        table
            .rows()
            .iter()
            .map(|row| ScheduleRecord::from_row(table, row))
            .collect(),
    )
}

/// Returns timeline intervals, optionally for one device.
///
/// `GET /timeline` → 200 + `Vec<IntervalRecord>` JSON
/// `GET /timeline?device=water_pump` → that device's runs
/// `GET /timeline?device=unknown` → 404 + `ErrorResponse`
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimelineQuery>,
) -> impl IntoResponse {
    let plan = &state.plan;
    let records: Vec<IntervalRecord> = match query.device {
        None => plan.timeline.iter().map(IntervalRecord::from).collect(),
        Some(device) => {
            if !plan.report.table.devices().iter().any(|d| *d == device) {
                return Err((
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse {
                        error: format!("device \"{device}\" is not in the schedule"),
                    }),
                ));
            }
            plan.timeline
                .iter()
                .filter(|i| i.device == device)
                .map(IntervalRecord::from)
                .collect()
        }
    };
    Ok(Json(records))
}

/// Returns forecast figures, KPIs and per-device outcomes.
///
/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let plan = &state.plan;
    let report = &plan.report;
    Json(SummaryResponse {
        site: state.site_name.clone(),
        date: plan.grid.date().to_string(),
        timezone: plan.grid.tz().name().to_string(),
        capacity_kw: state.capacity_kw,
        forecast: plan.summary.clone(),
        kpi: plan.kpi.clone(),
        placements: report.placements.iter().map(PlacementRecord::from).collect(),
        rejected: report.rejected.iter().map(RejectedRecord::from).collect(),
        forecast_gaps: report.forecast_gaps.clone(),
        message: (!report.has_controllable_loads()).then(|| NO_CONTROLLABLE_LOADS.to_string()),
    })
}
