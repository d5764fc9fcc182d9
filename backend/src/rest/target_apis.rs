//! # REST API for Prize Targets
//!
//! Every endpoint returns the full child ledger after allocation has run.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{post, put},
    Router,
};
use tracing::{error, info};

use crate::domain::commands::ledger::{AddTargetCommand, EditTargetCommand};
use crate::AppState;
use shared::{CreatePrizeTargetRequest, UpdatePrizeTargetRequest};

/// Create a router for prize target APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/children/:child_id/targets", post(add_target))
        .route(
            "/children/:child_id/targets/:target_id",
            put(edit_target).delete(delete_target),
        )
}

/// Add a prize target to the end of the funding order
pub async fn add_target(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Json(request): Json<CreatePrizeTargetRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/targets - request: {:?}", child_id, request);

    let command = AddTargetCommand {
        name: request.name,
        target_type: request.target_type,
        target_count: request.target_count,
    };

    match state.ledger_service.add_target(&child_id, command).await {
        Ok(child) => (StatusCode::CREATED, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to add prize target: {}", e);
            e.into_response()
        }
    }
}

pub async fn edit_target(
    State(state): State<AppState>,
    Path((child_id, target_id)): Path<(String, String)>,
    Json(request): Json<UpdatePrizeTargetRequest>,
) -> impl IntoResponse {
    info!(
        "PUT /api/children/{}/targets/{} - request: {:?}",
        child_id, target_id, request
    );

    let command = EditTargetCommand {
        name: request.name,
        target_type: request.target_type,
        target_count: request.target_count,
        is_achieved: request.is_achieved,
    };

    match state.ledger_service.edit_target(&child_id, &target_id, command).await {
        Ok(child) => (StatusCode::OK, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to edit prize target {}: {}", target_id, e);
            e.into_response()
        }
    }
}

pub async fn delete_target(
    State(state): State<AppState>,
    Path((child_id, target_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{}/targets/{}", child_id, target_id);

    match state.ledger_service.delete_target(&child_id, &target_id).await {
        Ok(child) => (StatusCode::OK, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to delete prize target {}: {}", target_id, e);
            e.into_response()
        }
    }
}
