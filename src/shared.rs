use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::broadcast::Broadcaster;
use crate::leaderboard::service::LeaderboardService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub leaderboard_service: Arc<LeaderboardService>,
    pub broadcaster: Arc<dyn Broadcaster>,
}

impl AppState {
    pub fn new(
        leaderboard_service: Arc<LeaderboardService>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            leaderboard_service,
            broadcaster,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Score store error: {0}")]
    StoreError(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::StoreError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Score store error: {}", msg),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
