use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::games::GameId;
use crate::player::models::PlayerModel;

/// One completed game session. Append-only: an event is never updated
/// after it is written, only removed by cascading player deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvent {
    pub id: String,
    pub player_id: String,
    pub game_id: GameId,
    pub score: i64,
    pub time_played: i64, // Seconds, 0 when the game did not report one
    pub created_at: DateTime<Utc>,
}

impl ScoreEvent {
    pub fn new(player_id: String, game_id: GameId, score: i64, time_played: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            player_id,
            game_id,
            score,
            time_played,
            created_at: Utc::now(),
        }
    }
}

/// Cached best score for one (player, game) pair.
///
/// `achieved_at` is the timestamp of the event that set the current
/// maximum; an equal later score never moves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreModel {
    pub id: String,
    pub player_id: String,
    pub game_id: GameId,
    pub high_score: i64,
    pub achieved_at: DateTime<Utc>,
}

impl HighScoreModel {
    pub fn new(player_id: String, game_id: GameId, high_score: i64, achieved_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            player_id,
            game_id,
            high_score,
            achieved_at,
        }
    }
}

/// Snapshot returned by the stats endpoint. Matches the JSON shape the
/// front end already consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player: PlayerModel,
    pub total_games: i64,
    pub total_score: i64,
    pub average_score: i64,
    pub high_scores: HashMap<GameId, i64>,
    pub recent_scores: Vec<ScoreEvent>,
}

/// One leaderboard row: a (player, game) high score joined to its player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player: PlayerModel,
    pub game_id: GameId,
    pub high_score: i64,
    pub achieved_at: DateTime<Utc>,
}
