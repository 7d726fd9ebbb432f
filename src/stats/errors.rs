use thiserror::Error;

use crate::shared::AppError;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<AppError> for StatsError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::NotFound(msg) => StatsError::PlayerNotFound(msg),
            other => StatsError::Persistence(other.to_string()),
        }
    }
}

impl From<StatsError> for AppError {
    fn from(error: StatsError) -> Self {
        match error {
            StatsError::PlayerNotFound(msg) => AppError::NotFound(msg),
            StatsError::InvalidScore(msg) | StatsError::InvalidArgument(msg) => {
                AppError::BadRequest(msg)
            }
            StatsError::Persistence(msg) => AppError::DatabaseError(msg),
        }
    }
}
