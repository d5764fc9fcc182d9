//! # REST API for Child Management
//!
//! Endpoints for child profiles, their settings and manual prize adjustments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use crate::domain::commands::children::CreateChildCommand;
use crate::domain::commands::ledger::UpdateSettingsCommand;
use crate::AppState;
use shared::{ChildListResponse, CreateChildRequest, DeleteChildQuery, UpdateSettingsRequest};

/// Create a router for child related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/children", post(create_child))
        .route("/parents/:parent_id/children", get(list_children))
        .route("/children/:child_id", get(get_child).delete(delete_child))
        .route("/children/:child_id/settings", post(update_settings))
        .route("/children/:child_id/prizes/increment", post(increment_prizes))
        .route("/children/:child_id/prizes/decrement", post(decrement_prizes))
}

/// Create a new child
pub async fn create_child(
    State(state): State<AppState>,
    Json(request): Json<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/children - request: {:?}", request);

    let command = CreateChildCommand {
        parent_id: request.parent_id,
        name: request.name,
    };

    match state.child_service.create_child(command).await {
        Ok(child) => (StatusCode::CREATED, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to create child: {}", e);
            e.into_response()
        }
    }
}

/// List every child of a parent
pub async fn list_children(
    State(state): State<AppState>,
    Path(parent_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/parents/{}/children", parent_id);

    match state.child_service.list_children(&parent_id).await {
        Ok(children) => (StatusCode::OK, Json(ChildListResponse { children })).into_response(),
        Err(e) => {
            error!("Failed to list children: {}", e);
            e.into_response()
        }
    }
}

pub async fn get_child(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}", child_id);

    match state.child_service.get_child(&child_id).await {
        Ok(child) => (StatusCode::OK, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to get child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// Delete a child; the caller must name the owning parent
pub async fn delete_child(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Query(query): Query<DeleteChildQuery>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{}?parent_id={}", child_id, query.parent_id);

    match state.child_service.delete_child(&query.parent_id, &child_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to delete child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

/// Update name, prize mode or background pattern
pub async fn update_settings(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Json(request): Json<UpdateSettingsRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/settings - request: {:?}", child_id, request);

    let command = UpdateSettingsCommand {
        name: request.name,
        prize_mode: request.prize_mode,
        background_pattern: request.background_pattern,
    };

    match state.ledger_service.update_settings(&child_id, command).await {
        Ok(child) => (StatusCode::OK, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to update settings of child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

pub async fn increment_prizes(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/prizes/increment", child_id);

    match state.ledger_service.increment_prizes(&child_id).await {
        Ok(child) => (StatusCode::OK, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to increment prizes of child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

pub async fn decrement_prizes(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/prizes/decrement", child_id);

    match state.ledger_service.decrement_prizes(&child_id).await {
        Ok(child) => (StatusCode::OK, Json(child)).into_response(),
        Err(e) => {
            error!("Failed to decrement prizes of child {}: {}", child_id, e);
            e.into_response()
        }
    }
}
