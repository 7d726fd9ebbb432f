use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::leaderboard::DEFAULT_LEADERBOARD_LIMIT;
use super::models::{LeaderboardEntry, PlayerStats, ScoreEvent};
use crate::games::GameId;
use crate::shared::{AppError, AppState};

/// How many recent events the stats endpoint returns when the caller
/// does not ask for a specific count.
pub const DEFAULT_RECENT_SCORES: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScoreRequest {
    pub player_id: String,
    pub game_id: String,
    pub score: i64,
    #[serde(default)]
    pub time_played: i64,
}

/// HTTP handler for recording a completed game session
///
/// POST /api/scores
#[instrument(name = "save_score", skip(state, request))]
pub async fn save_score(
    State(state): State<AppState>,
    Json(request): Json<SaveScoreRequest>,
) -> Result<Json<ScoreEvent>, AppError> {
    let game_id = GameId::try_from(request.game_id.as_str())
        .map_err(|bad| AppError::BadRequest(format!("Unknown game id: {}", bad)))?;

    let (event, player) = state
        .stats_service
        .record_score(
            &request.player_id,
            game_id,
            request.score,
            request.time_played,
        )
        .await?;

    info!(
        player_id = %player.id,
        game_id = %game_id,
        score = event.score,
        level = player.level,
        "Score saved"
    );

    Ok(Json(event))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<usize>,
}

/// HTTP handler for the player stats projection
///
/// GET /api/players/:id/stats?limit=
#[instrument(name = "get_player_stats", skip(state))]
pub async fn get_player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<PlayerStats>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_SCORES);
    let stats = state
        .stats_service
        .get_player_stats(&player_id, limit)
        .await?;

    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub game_id: Option<String>,
    pub limit: Option<i64>,
}

/// HTTP handler for the leaderboard
///
/// GET /api/leaderboard?gameId=&limit=
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let game_id = query
        .game_id
        .as_deref()
        .map(GameId::try_from)
        .transpose()
        .map_err(|bad| AppError::BadRequest(format!("Unknown game id: {}", bad)))?;
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);

    let board = state
        .leaderboard_service
        .get_leaderboard(game_id, limit)
        .await?;

    Ok(Json(board))
}
