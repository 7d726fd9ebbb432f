use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::models::PlayerModel;
use super::service::PlayerService;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub name: String,
}

/// HTTP handler for registering a new player
///
/// POST /api/players
#[instrument(name = "create_player", skip(state, request))]
pub async fn create_player(
    State(state): State<AppState>,
    Json(request): Json<CreatePlayerRequest>,
) -> Result<Json<PlayerModel>, AppError> {
    // Use injected repositories from app state
    let service = PlayerService::new(
        Arc::clone(&state.player_repository),
        Arc::clone(&state.score_repository),
    );
    let player = service.register_player(&request.name).await?;

    info!(player_id = %player.id, name = %player.name, "Player created");
    Ok(Json(player))
}

/// HTTP handler for fetching a player by id
///
/// GET /api/players/:id
#[instrument(name = "get_player", skip(state))]
pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerModel>, AppError> {
    let service = PlayerService::new(
        Arc::clone(&state.player_repository),
        Arc::clone(&state.score_repository),
    );
    let player = service.get_player(&player_id).await?;

    Ok(Json(player))
}

/// HTTP handler for the administrative cascading delete
///
/// DELETE /api/players/:id
#[instrument(name = "delete_player", skip(state))]
pub async fn delete_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let service = PlayerService::new(
        Arc::clone(&state.player_repository),
        Arc::clone(&state.score_repository),
    );
    service.delete_player(&player_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
