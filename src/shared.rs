use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::player::repository::PlayerRepository;
use crate::stats::leaderboard::LeaderboardService;
use crate::stats::repository::ScoreRepository;
use crate::stats::service::{Leveling, StatsService};

/// Shared application state containing all dependencies
///
/// The stats service lives here rather than being rebuilt per request
/// because it carries the per-player write locks.
#[derive(Clone)]
pub struct AppState {
    pub player_repository: Arc<dyn PlayerRepository + Send + Sync>,
    pub score_repository: Arc<dyn ScoreRepository + Send + Sync>,
    pub stats_service: Arc<StatsService>,
    pub leaderboard_service: Arc<LeaderboardService>,
}

impl AppState {
    pub fn new(
        player_repository: Arc<dyn PlayerRepository + Send + Sync>,
        score_repository: Arc<dyn ScoreRepository + Send + Sync>,
        leveling: Leveling,
    ) -> Self {
        let stats_service = Arc::new(StatsService::new(
            Arc::clone(&player_repository),
            Arc::clone(&score_repository),
            leveling,
        ));
        let leaderboard_service = Arc::new(LeaderboardService::new(
            Arc::clone(&player_repository),
            Arc::clone(&score_repository),
        ));

        Self {
            player_repository,
            score_repository,
            stats_service,
            leaderboard_service,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
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
