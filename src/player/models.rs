use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the players table
///
/// `id`, `name`, `avatar` and `created_at` are fixed at registration.
/// Everything else is derived from the player's score events and is only
/// ever written by the stats service after a new event lands.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerModel {
    pub id: String, // UUID v4 as string
    pub name: String,
    pub avatar: String, // First letter of the name, uppercased
    pub created_at: DateTime<Utc>,
    pub level: i64,
    pub total_play_time: i64, // Seconds across all recorded sessions
    pub total_score: i64,
    pub games_played: i64,
    pub high_score: i64,
    pub average_score: i64,
}

impl PlayerModel {
    /// Creates a fresh player with a generated ID and zeroed stats
    pub fn new(name: String) -> Self {
        let avatar = name
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            avatar,
            created_at: Utc::now(),
            level: 1,
            total_play_time: 0,
            total_score: 0,
            games_played: 0,
            high_score: 0,
            average_score: 0,
        }
    }
}
