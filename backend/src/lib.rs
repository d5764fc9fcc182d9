//! # Star Chart Backend
//!
//! Server side of a weekly behavior chart. Parents mark morning, afternoon
//! and evening slots with stars or crosses; stars roll up into perfect days
//! and perfect weeks, and those currencies fund prize targets.
//!
//! ## Architecture
//!
//! ```text
//! REST layer (axum handlers)
//!     ↓
//! Domain layer (chart grid, ledger, slot update transaction)
//!     ↓
//! Storage layer (typed entities over an atomic key-value store)
//!     ↓
//! SQLite
//! ```

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod rest;
pub mod storage;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::db::DbConnection;
use crate::domain::{ChartWeekService, ChildService, LedgerService, SlotUpdateService};
use crate::storage::EntityStore;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub child_service: ChildService,
    pub chart_week_service: ChartWeekService,
    pub ledger_service: LedgerService,
    pub slot_update_service: SlotUpdateService,
}

impl AppState {
    /// Wire every service over one database connection
    pub fn from_db(db: DbConnection) -> Self {
        let store = EntityStore::new(Arc::new(db));

        let child_service = ChildService::new(store.clone());
        let chart_week_service = ChartWeekService::new(store.clone());
        let ledger_service = LedgerService::new(store);
        let slot_update_service = SlotUpdateService::new(
            chart_week_service.clone(),
            child_service.clone(),
            ledger_service.clone(),
        );

        Self {
            child_service,
            chart_week_service,
            ledger_service,
            slot_update_service,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    info!("Setting up domain model");
    Ok(AppState::from_db(db))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", rest::api_router())
        .layer(cors)
        .with_state(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_support::{parse, send_empty};
    use axum::http::{Method, StatusCode};
    use shared::Child;

    #[tokio::test]
    async fn test_state_survives_reopening_database() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = AppConfig {
            database_url: format!("sqlite:{}", dir.path().join("chart.db").display()),
            ..AppConfig::default()
        };

        let child_id = {
            let state = initialize_backend(&config).await?;
            let app = create_router(state, &config.cors_origin)?;
            let child = crate::rest::test_support::create_child(&app, "parent-1", "Alice").await?;
            child.id
        };

        let app = create_router(initialize_backend(&config).await?, &config.cors_origin)?;
        let (status, body) = send_empty(&app, Method::GET, &format!("/api/children/{}", child_id)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<Child>(&body)?.name, "Alice");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_router_rejects_bad_origin() -> Result<(), Box<dyn std::error::Error>> {
        let state = AppState::from_db(DbConnection::init_test().await?);
        assert!(create_router(state, "bad\norigin").is_err());
        Ok(())
    }
}
