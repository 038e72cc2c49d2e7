//! REST API over a finished day plan.
//!
//! Provides three GET endpoints:
//! - `/schedule`: the per-slot load table
//! - `/timeline`: contiguous device runs, with an optional `device` filter
//! - `/summary`: forecast figures, KPIs and per-device outcomes

pub mod handlers;
pub mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::runner::DayPlan;

/// Immutable application state shared across all request handlers.
///
/// Built once after planning and wrapped in `Arc`; no locks are needed
/// since everything is read-only.
#[derive(Debug)]
pub struct AppState {
    /// Site display name.
    pub site_name: String,
    /// Ceiling the plan was built under (kW).
    pub capacity_kw: Option<f32>,
    /// The plan being served.
    pub plan: DayPlan,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/schedule", get(handlers::get_schedule))
        .route("/timeline", get(handlers::get_timeline))
        .route("/summary", get(handlers::get_summary))
        .with_state(state)
}

/// Binds to `addr` and serves the API until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(crate::telemetry::shutdown_signal())
        .await
}
