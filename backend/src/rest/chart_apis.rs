//! # REST API for the Chart Grid
//!
//! Endpoints for reading a week, updating a single slot and resetting a week.
//! Slot updates return the full updated week plus the child ledger when the
//! update changed it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use crate::domain::commands::chart::{ToggleSlotCommand, WeekRef};
use crate::domain::ChartWeekService;
use crate::error::ChartError;
use crate::AppState;
use shared::{CurrentWeekResponse, ResetChartResponse, UpdateSlotRequest, UpdateSlotResponse};

/// Create a router for chart related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chart/current-week", get(get_current_week))
        .route(
            "/children/:child_id/chart/:year/:week",
            get(get_chart_week).post(update_slot),
        )
        .route("/children/:child_id/chart/:year/:week/reset", post(reset_chart_week))
}

/// ISO year and week of today
pub async fn get_current_week() -> impl IntoResponse {
    info!("GET /api/chart/current-week");

    let (year, week) = ChartWeekService::current_week();
    (StatusCode::OK, Json(CurrentWeekResponse { year, week }))
}

/// Get a child's week, creating an empty one on first access
pub async fn get_chart_week(
    State(state): State<AppState>,
    Path((child_id, year, week)): Path<(String, i32, u32)>,
) -> Response {
    info!("GET /api/children/{}/chart/{}/{}", child_id, year, week);

    match state.child_service.child_exists(&child_id).await {
        Ok(true) => {}
        Ok(false) => return ChartError::ChildNotFound(child_id).into_response(),
        Err(e) => {
            error!("Failed to look up child {}: {}", child_id, e);
            return e.into_response();
        }
    }

    let week_ref = WeekRef::new(child_id, year, week);
    match state.chart_week_service.get_week(&week_ref).await {
        Ok(chart_week) => (StatusCode::OK, Json(chart_week)).into_response(),
        Err(e) => {
            error!("Failed to get chart week {}: {}", week_ref.week_id(), e);
            e.into_response()
        }
    }
}

/// Set or advance one slot
pub async fn update_slot(
    State(state): State<AppState>,
    Path((child_id, year, week)): Path<(String, i32, u32)>,
    Json(request): Json<UpdateSlotRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/children/{}/chart/{}/{} - request: {:?}",
        child_id, year, week, request
    );

    let command = ToggleSlotCommand {
        week: WeekRef::new(child_id, year, week),
        day_index: request.day_index,
        slot_index: request.slot_index,
        new_state: request.state,
    };

    match state.slot_update_service.toggle_slot(command).await {
        Ok(result) => {
            let response = UpdateSlotResponse {
                chart_week: result.chart_week,
                child: result.child,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to update slot: {}", e);
            e.into_response()
        }
    }
}

/// Clear the week and the child's reward progress
pub async fn reset_chart_week(
    State(state): State<AppState>,
    Path((child_id, year, week)): Path<(String, i32, u32)>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/chart/{}/{}/reset", child_id, year, week);

    match state
        .slot_update_service
        .reset_week(WeekRef::new(child_id, year, week))
        .await
    {
        Ok(result) => {
            let response = ResetChartResponse {
                chart_week: result.chart_week,
                child: result.child,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to reset chart week: {}", e);
            e.into_response()
        }
    }
}
