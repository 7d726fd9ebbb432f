use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::PlayerModel;
use crate::shared::AppError;

/// Trait for player repository operations
#[async_trait]
pub trait PlayerRepository {
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError>;
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError>;
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError>;
    async fn delete_player(&self, player_id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of PlayerRepository for development and testing
///
/// Data is stored in memory and lost when the application restarts.
pub struct InMemoryPlayerRepository {
    players: Mutex<HashMap<String, PlayerModel>>,
}

impl Default for InMemoryPlayerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of registered players
    pub fn player_count(&self) -> usize {
        self.players.lock().unwrap().len()
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, name = %player.name, "Creating player in memory");

        let mut players = self.players.lock().unwrap();
        if players.contains_key(&player.id) {
            warn!(player_id = %player.id, "Player already exists in memory");
            return Err(AppError::DatabaseError("Player already exists".to_string()));
        }
        players.insert(player.id.clone(), player.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let players = self.players.lock().unwrap();
        let player = players.get(player_id).cloned();

        match &player {
            Some(p) => debug!(player_id = %player_id, name = %p.name, "Player found in memory"),
            None => debug!(player_id = %player_id, "Player not found in memory"),
        }

        Ok(player)
    }

    #[instrument(skip(self, player))]
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Updating player in memory");

        let mut players = self.players.lock().unwrap();
        if !players.contains_key(&player.id) {
            warn!(player_id = %player.id, "Player not found for update in memory");
            return Err(AppError::NotFound("Player not found".to_string()));
        }
        players.insert(player.id.clone(), player.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &str) -> Result<(), AppError> {
        debug!(player_id = %player_id, "Deleting player from memory");

        let mut players = self.players.lock().unwrap();
        if players.remove(player_id).is_none() {
            warn!(player_id = %player_id, "Player not found for deletion in memory");
            return Err(AppError::NotFound("Player not found".to_string()));
        }

        Ok(())
    }
}

/// PostgreSQL implementation of player repository
pub struct PostgresPlayerRepository {
    pool: PgPool,
}

impl PostgresPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn player_from_row(row: &sqlx::postgres::PgRow) -> PlayerModel {
    PlayerModel {
        id: row.get("id"),
        name: row.get("name"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
        level: row.get("level"),
        total_play_time: row.get("total_play_time"),
        total_score: row.get("total_score"),
        games_played: row.get("games_played"),
        high_score: row.get("high_score"),
        average_score: row.get("average_score"),
    }
}

#[async_trait]
impl PlayerRepository for PostgresPlayerRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, name = %player.name, "Creating player in database");

        sqlx::query(
            "INSERT INTO players (id, name, avatar, created_at, level, total_play_time, total_score, games_played, high_score, average_score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&player.id)
        .bind(&player.name)
        .bind(&player.avatar)
        .bind(player.created_at)
        .bind(player.level)
        .bind(player.total_play_time)
        .bind(player.total_score)
        .bind(player.games_played)
        .bind(player.high_score)
        .bind(player.average_score)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create player in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, avatar, created_at, level, total_play_time, total_score, games_played, high_score, average_score \
             FROM players WHERE id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player_id, "Failed to fetch player from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.as_ref().map(player_from_row))
    }

    #[instrument(skip(self, player))]
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Updating player in database");

        let result = sqlx::query(
            "UPDATE players SET level = $2, total_play_time = $3, total_score = $4, games_played = $5, high_score = $6, average_score = $7 \
             WHERE id = $1",
        )
        .bind(&player.id)
        .bind(player.level)
        .bind(player.total_play_time)
        .bind(player.total_score)
        .bind(player.games_played)
        .bind(player.high_score)
        .bind(player.average_score)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player.id, "Failed to update player in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(player_id = %player.id, "Player not found for update");
            return Err(AppError::NotFound("Player not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &str) -> Result<(), AppError> {
        debug!(player_id = %player_id, "Deleting player from database");

        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, player_id = %player_id, "Failed to delete player from database");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(player_id = %player_id, "Player not found for deletion");
            return Err(AppError::NotFound("Player not found".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_player() {
        let repo = InMemoryPlayerRepository::new();
        let player = PlayerModel::new("test-player".to_string());

        repo.create_player(&player).await.unwrap();

        let retrieved = repo.get_player(&player.id).await.unwrap();
        assert!(retrieved.is_some());
        let retrieved_player = retrieved.unwrap();
        assert_eq!(retrieved_player.id, player.id);
        assert_eq!(retrieved_player.name, player.name);
    }

    #[tokio::test]
    async fn test_get_nonexistent_player() {
        let repo = InMemoryPlayerRepository::new();

        let result = repo.get_player("nonexistent-id").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_player() {
        let repo = InMemoryPlayerRepository::new();
        let player = PlayerModel::new("test-player".to_string());

        repo.create_player(&player).await.unwrap();

        let result = repo.create_player(&player).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_update_player() {
        let repo = InMemoryPlayerRepository::new();
        let mut player = PlayerModel::new("test-player".to_string());

        repo.create_player(&player).await.unwrap();

        player.total_score = 42;
        player.games_played = 1;
        repo.update_player(&player).await.unwrap();

        let retrieved = repo.get_player(&player.id).await.unwrap().unwrap();
        assert_eq!(retrieved.total_score, 42);
        assert_eq!(retrieved.games_played, 1);
    }

    #[tokio::test]
    async fn test_update_nonexistent_player() {
        let repo = InMemoryPlayerRepository::new();
        let player = PlayerModel::new("test-player".to_string());

        let result = repo.update_player(&player).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_player() {
        let repo = InMemoryPlayerRepository::new();
        let player = PlayerModel::new("test-player".to_string());

        repo.create_player(&player).await.unwrap();
        repo.delete_player(&player.id).await.unwrap();

        let result = repo.get_player(&player.id).await.unwrap();
        assert!(result.is_none());
        assert_eq!(repo.player_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_player() {
        let repo = InMemoryPlayerRepository::new();

        let result = repo.delete_player("nonexistent-id").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_names_are_distinct_players() {
        let repo = InMemoryPlayerRepository::new();
        let first = PlayerModel::new("ana".to_string());
        let second = PlayerModel::new("ana".to_string());

        repo.create_player(&first).await.unwrap();
        repo.create_player(&second).await.unwrap();

        assert_eq!(repo.player_count(), 2);
    }
}
