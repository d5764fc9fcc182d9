//! # REST API Interface Layer
//!
//! HTTP endpoints for the star chart. Handlers translate request DTOs from
//! the `shared` crate into domain commands, call the services held in
//! [`AppState`](crate::AppState) and translate domain errors into status codes.
//!
//! | Error                                   | Status |
//! |-----------------------------------------|--------|
//! | invalid index, week, target or settings | 400    |
//! | unknown child                           | 404    |
//! | child owned by another parent           | 403    |
//! | storage or serialization failure        | 500    |

pub mod chart_apis;
pub mod child_apis;
pub mod target_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use shared::ErrorResponse;

use crate::error::ChartError;
use crate::AppState;

impl ChartError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChartError::ChildNotFound(_) => StatusCode::NOT_FOUND,
            ChartError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ChartError::Database(_) | ChartError::Serialization(_) | ChartError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChartError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// All API routes, relative to `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(child_apis::router())
        .merge(chart_apis::router())
        .merge(target_apis::router())
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use tower::ServiceExt;

    use crate::db::DbConnection;
    use crate::{create_router, AppState};

    pub type TestResult = Result<(), Box<dyn std::error::Error>>;

    pub async fn test_app() -> Result<Router, Box<dyn std::error::Error>> {
        let db = DbConnection::init_test().await?;
        Ok(create_router(AppState::from_db(db), "http://localhost:8080")?)
    }

    /// Send one request and return the status with the raw body
    pub async fn send<B: Serialize>(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<&B>,
    ) -> Result<(StatusCode, Vec<u8>), Box<dyn std::error::Error>> {
        let builder = Request::builder().uri(uri).method(method);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, bytes.to_vec()))
    }

    pub async fn send_empty(
        app: &Router,
        method: Method,
        uri: &str,
    ) -> Result<(StatusCode, Vec<u8>), Box<dyn std::error::Error>> {
        send::<()>(app, method, uri, None).await
    }

    pub fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, Box<dyn std::error::Error>> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Create a child through the API
    pub async fn create_child(
        app: &Router,
        parent_id: &str,
        name: &str,
    ) -> Result<shared::Child, Box<dyn std::error::Error>> {
        let request = shared::CreateChildRequest {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
        };
        let (status, body) = send(app, Method::POST, "/api/children", Some(&request)).await?;
        assert_eq!(status, StatusCode::CREATED);
        parse(&body)
    }
}
